use axum::{
    Extension,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use std::collections::HashMap;

use crate::{
    adapters::inbound::http::{
        dto::{ListMarkers, ListVersionsResultDto, VersioningConfigurationDto, to_xml},
        error::{ApiError, ScopedResult},
        middleware::RequestScope,
        router::AppState,
    },
    domain::{
        errors::{INVALID_VERSION_ID, StorageError},
        models::{CannedAcl, ListVersionsRequest},
        value_objects::{BucketName, ObjectKey, VersionId},
    },
};

const ACL_HEADER: &str = "x-amz-acl";
const MAX_KEYS_LIMIT: usize = 1000;

fn xml_response(body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        body,
    )
        .into_response()
}

fn canned_acl(headers: &HeaderMap) -> Result<CannedAcl, StorageError> {
    let Some(value) = headers.get(ACL_HEADER) else {
        return Ok(CannedAcl::default());
    };

    value
        .to_str()
        .ok()
        .and_then(CannedAcl::from_header)
        .ok_or_else(|| {
            StorageError::invalid_argument_value(
                "Unsupported canned ACL",
                ACL_HEADER,
                String::from_utf8_lossy(value.as_bytes()),
            )
        })
}

fn max_keys(query: &HashMap<String, String>) -> Result<usize, StorageError> {
    match query.get("max-keys") {
        None => Ok(MAX_KEYS_LIMIT),
        Some(raw) => raw
            .parse::<usize>()
            .map(|value| value.min(MAX_KEYS_LIMIT))
            .map_err(|_| {
                StorageError::invalid_argument_value(
                    "Provided max-keys not an integer or within integer range",
                    "max-keys",
                    raw.clone(),
                )
            }),
    }
}

/// Non-empty value of a query parameter
fn query_value<'a>(query: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    query.get(name).map(String::as_str).filter(|value| !value.is_empty())
}

fn listing_markers(
    query: &HashMap<String, String>,
) -> Result<(Option<ObjectKey>, Option<VersionId>), StorageError> {
    let key_marker = query_value(query, "key-marker")
        .map(ObjectKey::try_from)
        .transpose()?;
    let version_id_marker = query_value(query, "version-id-marker")
        .map(|raw| {
            VersionId::parse(raw).map_err(|_| {
                StorageError::invalid_argument_value(INVALID_VERSION_ID, "version-id-marker", raw)
            })
        })
        .transpose()?;

    Ok((key_marker, version_id_marker))
}

/// `PUT /{bucket}`: create a bucket, or configure versioning with `?versioning`
pub async fn put_bucket(
    State(app_state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    Path(bucket): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let bucket = BucketName::new(bucket).scoped(&scope)?;

    if query.contains_key("versioning") {
        let body = std::str::from_utf8(&body)
            .map_err(|e| StorageError::MalformedXml {
                reason: e.to_string(),
            })
            .scoped(&scope)?;
        let versioning = VersioningConfigurationDto::parse(body).scoped(&scope)?;

        app_state
            .bucket_service
            .put_bucket_versioning(&scope.context, &bucket, versioning)
            .await
            .scoped(&scope)?;
        return Ok(StatusCode::OK.into_response());
    }

    let acl = canned_acl(&headers).scoped(&scope)?;
    let created = app_state
        .bucket_service
        .create_bucket(&scope.context, bucket, acl)
        .await
        .scoped(&scope)?;

    Ok((
        StatusCode::OK,
        [(header::LOCATION, format!("/{}", created.name))],
    )
        .into_response())
}

/// `GET /{bucket}`: `?versioning` or `?versions`
pub async fn get_bucket(
    State(app_state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    Path(bucket): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let bucket = BucketName::new(bucket).scoped(&scope)?;

    if query.contains_key("versioning") {
        let versioning = app_state
            .bucket_service
            .get_bucket_versioning(&scope.context, &bucket)
            .await
            .scoped(&scope)?;
        let body = to_xml(&VersioningConfigurationDto::from_versioning(versioning))
            .scoped(&scope)?;
        return Ok(xml_response(body));
    }

    if query.contains_key("versions") {
        let max_keys = max_keys(&query).scoped(&scope)?;
        let prefix = query_value(&query, "prefix");
        let (key_marker, version_id_marker) = listing_markers(&query).scoped(&scope)?;

        // one extra entry tells whether the listing was cut short
        let request = ListVersionsRequest::builder()
            .bucket(bucket.clone())
            .maybe_prefix(prefix.map(str::to_string))
            .maybe_key_marker(key_marker)
            .maybe_version_id_marker(version_id_marker)
            .max_keys(max_keys + 1)
            .build();
        let mut listing = app_state
            .object_service
            .list_object_versions(&scope.context, request)
            .await
            .scoped(&scope)?;

        let is_truncated = listing.len() > max_keys;
        listing.truncate(max_keys);

        let markers = ListMarkers {
            prefix,
            key_marker: query_value(&query, "key-marker"),
            version_id_marker: query_value(&query, "version-id-marker"),
        };
        let dto = ListVersionsResultDto::new(&bucket, markers, max_keys, is_truncated, listing);
        return Ok(xml_response(to_xml(&dto).scoped(&scope)?));
    }

    Err(ApiError::new(
        StorageError::NotImplemented {
            operation: "ListObjects".to_string(),
        },
        &scope,
    ))
}
