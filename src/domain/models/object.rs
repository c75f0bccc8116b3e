use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::domain::value_objects::{BucketName, ObjectKey, VersionId};

/// Request to store an object
#[derive(Debug, Clone, bon::Builder)]
pub struct PutObjectRequest {
    pub bucket: BucketName,
    pub key: ObjectKey,
    pub data: Bytes,
    pub content_type: Option<String>,
}

/// Request to read an object, optionally pinned to a version
#[derive(Debug, Clone, bon::Builder)]
pub struct GetObjectRequest {
    pub bucket: BucketName,
    pub key: ObjectKey,
    pub version_id: Option<VersionId>,
}

/// Request to delete an object or one of its versions
#[derive(Debug, Clone, bon::Builder)]
pub struct DeleteObjectRequest {
    pub bucket: BucketName,
    pub key: ObjectKey,
    pub version_id: Option<VersionId>,
}

/// Request to list versions in a bucket
#[derive(Debug, Clone, bon::Builder)]
pub struct ListVersionsRequest {
    pub bucket: BucketName,
    pub prefix: Option<String>,
    /// Resume after this key
    pub key_marker: Option<ObjectKey>,
    /// Resume after this version of `key_marker`
    pub version_id_marker: Option<VersionId>,
    #[builder(default = 1000)]
    pub max_keys: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutObjectOutput {
    pub etag: String,
    /// Present only when the bucket has versioning configured
    pub version_id: Option<VersionId>,
}

/// Metadata returned by GET and HEAD
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectHead {
    pub content_length: u64,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub last_modified: DateTime<Utc>,
    /// Echoed in `x-amz-version-id` when set
    pub version_id: Option<VersionId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetObjectOutput {
    pub head: ObjectHead,
    pub data: Bytes,
}

/// Outcome of a DELETE; both fields unset for a skipped request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteObjectOutput {
    /// `x-amz-delete-marker: true`
    pub delete_marker: bool,
    /// `x-amz-version-id`
    pub version_id: Option<VersionId>,
}
