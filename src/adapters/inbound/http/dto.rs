use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    errors::StorageError,
    models::{BucketVersioning, VersionListing},
    value_objects::BucketName,
};

pub const S3_XMLNS: &str = "http://s3.amazonaws.com/doc/2006-03-01/";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Serialize a DTO into an XML document
pub fn to_xml<T: Serialize>(value: &T) -> Result<String, StorageError> {
    let body = quick_xml::se::to_string(value).map_err(|e| StorageError::InternalError {
        message: format!("Failed to serialize response: {}", e),
    })?;
    Ok(format!("{}{}", XML_DECLARATION, body))
}

/// Timestamp format used inside XML bodies
pub fn xml_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Body of GET and PUT `?versioning`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "VersioningConfiguration")]
pub struct VersioningConfigurationDto {
    #[serde(rename = "@xmlns", default, skip_serializing_if = "Option::is_none")]
    pub xmlns: Option<String>,
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "MfaDelete", default, skip_serializing_if = "Option::is_none")]
    pub mfa_delete: Option<String>,
}

impl VersioningConfigurationDto {
    pub fn from_versioning(versioning: BucketVersioning) -> Self {
        Self {
            xmlns: Some(S3_XMLNS.to_string()),
            status: versioning.status().map(str::to_string),
            mfa_delete: None,
        }
    }

    /// Parse a request body into the requested versioning state
    pub fn parse(body: &str) -> Result<BucketVersioning, StorageError> {
        let dto: Self = quick_xml::de::from_str(body).map_err(|e| StorageError::MalformedXml {
            reason: e.to_string(),
        })?;

        let status = dto.status.ok_or_else(|| StorageError::MalformedXml {
            reason: "missing Status element".to_string(),
        })?;
        BucketVersioning::from_status(status.trim()).ok_or_else(|| StorageError::MalformedXml {
            reason: format!("unknown versioning status: {}", status),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionDto {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "VersionId")]
    pub version_id: String,
    #[serde(rename = "IsLatest")]
    pub is_latest: bool,
    #[serde(rename = "LastModified")]
    pub last_modified: String,
    #[serde(rename = "ETag")]
    pub etag: String,
    #[serde(rename = "Size")]
    pub size: u64,
    #[serde(rename = "StorageClass")]
    pub storage_class: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteMarkerDto {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "VersionId")]
    pub version_id: String,
    #[serde(rename = "IsLatest")]
    pub is_latest: bool,
    #[serde(rename = "LastModified")]
    pub last_modified: String,
}

/// One entry of a version listing, in chain order
#[derive(Debug, Clone, Serialize)]
pub enum ListEntryDto {
    Version(VersionDto),
    DeleteMarker(DeleteMarkerDto),
}

impl From<VersionListing> for ListEntryDto {
    fn from(listing: VersionListing) -> Self {
        let VersionListing { version, is_latest } = listing;

        if version.is_delete_marker {
            return ListEntryDto::DeleteMarker(DeleteMarkerDto {
                key: version.key.to_string(),
                version_id: version.version_id.encode(),
                is_latest,
                last_modified: xml_timestamp(&version.last_modified),
            });
        }

        ListEntryDto::Version(VersionDto {
            key: version.key.to_string(),
            version_id: version.version_id.encode(),
            is_latest,
            last_modified: xml_timestamp(&version.last_modified),
            etag: format!("\"{}\"", version.etag.as_deref().unwrap_or_default()),
            size: version.byte_length(),
            storage_class: "STANDARD".to_string(),
        })
    }
}

/// Where a listing page started, as sent by the client
#[derive(Debug, Clone, Default)]
pub struct ListMarkers<'a> {
    pub prefix: Option<&'a str>,
    pub key_marker: Option<&'a str>,
    pub version_id_marker: Option<&'a str>,
}

/// Body of GET `?versions`
#[derive(Debug, Clone, Serialize)]
#[serde(rename = "ListVersionsResult")]
pub struct ListVersionsResultDto {
    #[serde(rename = "@xmlns")]
    pub xmlns: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Prefix")]
    pub prefix: String,
    #[serde(rename = "KeyMarker")]
    pub key_marker: String,
    #[serde(rename = "VersionIdMarker")]
    pub version_id_marker: String,
    #[serde(rename = "NextKeyMarker", skip_serializing_if = "Option::is_none")]
    pub next_key_marker: Option<String>,
    #[serde(rename = "NextVersionIdMarker", skip_serializing_if = "Option::is_none")]
    pub next_version_id_marker: Option<String>,
    #[serde(rename = "MaxKeys")]
    pub max_keys: usize,
    #[serde(rename = "IsTruncated")]
    pub is_truncated: bool,
    #[serde(rename = "$value")]
    pub entries: Vec<ListEntryDto>,
}

impl ListVersionsResultDto {
    /// `listing` is the page itself; when `is_truncated` its last entry
    /// becomes the next markers
    pub fn new(
        bucket: &BucketName,
        markers: ListMarkers<'_>,
        max_keys: usize,
        is_truncated: bool,
        listing: Vec<VersionListing>,
    ) -> Self {
        let (next_key_marker, next_version_id_marker) = match listing.last() {
            Some(last) if is_truncated => (
                Some(last.version.key.to_string()),
                Some(last.version.version_id.encode()),
            ),
            _ => (None, None),
        };

        Self {
            xmlns: S3_XMLNS.to_string(),
            name: bucket.to_string(),
            prefix: markers.prefix.unwrap_or_default().to_string(),
            key_marker: markers.key_marker.unwrap_or_default().to_string(),
            version_id_marker: markers.version_id_marker.unwrap_or_default().to_string(),
            next_key_marker,
            next_version_id_marker,
            max_keys,
            is_truncated,
            entries: listing.into_iter().map(ListEntryDto::from).collect(),
        }
    }
}

/// S3 error document
#[derive(Debug, Clone, Serialize)]
#[serde(rename = "Error")]
pub struct ErrorResponseDto {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "ArgumentName", skip_serializing_if = "Option::is_none")]
    pub argument_name: Option<String>,
    #[serde(rename = "ArgumentValue", skip_serializing_if = "Option::is_none")]
    pub argument_value: Option<String>,
    #[serde(rename = "Resource")]
    pub resource: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
}

impl ErrorResponseDto {
    pub fn from_storage_error(error: &StorageError, resource: &str, request_id: &str) -> Self {
        let (argument_name, argument_value) = match error {
            StorageError::InvalidArgument {
                argument: Some((name, value)),
                ..
            } => (Some(name.clone()), Some(value.clone())),
            _ => (None, None),
        };

        // infrastructure detail stays in the logs
        let message = match error {
            StorageError::InfrastructureError { .. } | StorageError::InternalError { .. } => {
                "We encountered an internal error. Please try again.".to_string()
            }
            _ => error.to_string(),
        };

        Self {
            code: error.code().to_string(),
            message,
            argument_name,
            argument_value,
            resource: resource.to_string(),
            request_id: request_id.to_string(),
        }
    }
}
