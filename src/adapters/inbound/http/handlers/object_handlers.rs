use axum::{
    Extension,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use std::collections::HashMap;

use crate::{
    adapters::inbound::http::{
        error::{ApiError, DELETE_MARKER_HEADER, ScopedResult, VERSION_ID_HEADER},
        middleware::RequestScope,
        router::AppState,
    },
    domain::{
        models::{DeleteObjectRequest, GetObjectRequest, ObjectHead, PutObjectRequest},
        value_objects::{BucketName, ObjectKey, VersionId},
        versioning::{check_version_pin, requested_version_id},
    },
};

const DEFAULT_CONTENT_TYPE: &str = "binary/octet-stream";

fn object_path(bucket: String, key: String, scope: &RequestScope) -> Result<(BucketName, ObjectKey), ApiError> {
    Ok((
        BucketName::new(bucket).scoped(scope)?,
        ObjectKey::new(key).scoped(scope)?,
    ))
}

fn insert_version_id(headers: &mut HeaderMap, version_id: Option<&VersionId>) {
    if let Some(value) = version_id.and_then(|id| HeaderValue::from_str(&id.encode()).ok()) {
        headers.insert(VERSION_ID_HEADER, value);
    }
}

fn insert_etag(headers: &mut HeaderMap, etag: Option<&str>) {
    if let Some(value) = etag.and_then(|etag| HeaderValue::from_str(&format!("\"{}\"", etag)).ok())
    {
        headers.insert(header::ETAG, value);
    }
}

fn head_headers(head: &ObjectHead) -> HeaderMap {
    let mut headers = HeaderMap::new();

    let content_type = head.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE);
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    let last_modified = head
        .last_modified
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string();
    if let Ok(value) = HeaderValue::from_str(&last_modified) {
        headers.insert(header::LAST_MODIFIED, value);
    }
    insert_etag(&mut headers, head.etag.as_deref());
    insert_version_id(&mut headers, head.version_id.as_ref());

    headers
}

/// `PUT /{bucket}/{key}`
pub async fn put_object(
    State(app_state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    check_version_pin(&query).scoped(&scope)?;
    let (bucket, key) = object_path(bucket, key, &scope)?;

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map(|s| s.to_string());

    let request = PutObjectRequest::builder()
        .bucket(bucket)
        .key(key)
        .data(body)
        .maybe_content_type(content_type)
        .build();

    let output = app_state
        .object_service
        .put_object(&scope.context, request)
        .await
        .scoped(&scope)?;

    let mut response_headers = HeaderMap::new();
    insert_etag(&mut response_headers, Some(&output.etag));
    insert_version_id(&mut response_headers, output.version_id.as_ref());

    Ok((StatusCode::OK, response_headers).into_response())
}

/// `GET /{bucket}/{key}`
pub async fn get_object(
    State(app_state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let version_id = requested_version_id(&query).scoped(&scope)?;
    let (bucket, key) = object_path(bucket, key, &scope)?;

    let request = GetObjectRequest::builder()
        .bucket(bucket)
        .key(key)
        .maybe_version_id(version_id)
        .build();

    let output = app_state
        .object_service
        .get_object(&scope.context, request)
        .await
        .scoped(&scope)?;

    Ok((StatusCode::OK, head_headers(&output.head), Body::from(output.data)).into_response())
}

/// `HEAD /{bucket}/{key}`
pub async fn head_object(
    State(app_state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let version_id = requested_version_id(&query).scoped(&scope)?;
    let (bucket, key) = object_path(bucket, key, &scope)?;

    let request = GetObjectRequest::builder()
        .bucket(bucket)
        .key(key)
        .maybe_version_id(version_id)
        .build();

    let head = app_state
        .object_service
        .head_object(&scope.context, request)
        .await
        .scoped(&scope)?;

    let mut headers = head_headers(&head);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(head.content_length));

    Ok((StatusCode::OK, headers).into_response())
}

/// `DELETE /{bucket}/{key}`
pub async fn delete_object(
    State(app_state): State<AppState>,
    Extension(scope): Extension<RequestScope>,
    Path((bucket, key)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let version_id = requested_version_id(&query).scoped(&scope)?;
    let (bucket, key) = object_path(bucket, key, &scope)?;

    let request = DeleteObjectRequest::builder()
        .bucket(bucket)
        .key(key)
        .maybe_version_id(version_id)
        .build();

    let output = app_state
        .object_service
        .delete_object(&scope.context, request)
        .await
        .scoped(&scope)?;

    let mut headers = HeaderMap::new();
    if output.delete_marker {
        headers.insert(DELETE_MARKER_HEADER, HeaderValue::from_static("true"));
    }
    insert_version_id(&mut headers, output.version_id.as_ref());

    Ok((StatusCode::NO_CONTENT, headers).into_response())
}
