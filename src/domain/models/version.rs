use chrono::{DateTime, Utc};

use crate::domain::value_objects::{BucketName, ObjectKey, VersionId};

/// Opaque location of a version's payload in the data store
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DataLocation(String);

impl DataLocation {
    /// A fresh, never reused location for a payload of `key` in `bucket`
    pub fn generate(bucket: &BucketName, key: &ObjectKey) -> Self {
        Self(format!(
            "{}/{}/{}",
            bucket.as_str(),
            uuid::Uuid::new_v4().simple(),
            md5_hex(key.as_str().as_bytes())
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Hex MD5 digest, the S3 ETag of a single-part payload
pub fn md5_hex(data: &[u8]) -> String {
    format!("{:x}", md5::compute(data))
}

/// One entry in an object's version chain
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectVersion {
    pub bucket: BucketName,
    pub key: ObjectKey,
    pub version_id: VersionId,
    pub is_delete_marker: bool,
    /// Absent for delete markers
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub data_location: Option<DataLocation>,
    pub last_modified: DateTime<Utc>,
}

impl ObjectVersion {
    /// Bytes held by this version, zero for delete markers
    pub fn byte_length(&self) -> u64 {
        self.content_length.unwrap_or(0)
    }
}

/// What the creation path needs to append a version; the metadata layer
/// assigns the version id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVersion {
    pub is_delete_marker: bool,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub etag: Option<String>,
    pub data_location: Option<DataLocation>,
}

impl NewVersion {
    pub fn object(
        content_length: u64,
        content_type: Option<String>,
        etag: String,
        data_location: DataLocation,
    ) -> Self {
        Self {
            is_delete_marker: false,
            content_length: Some(content_length),
            content_type,
            etag: Some(etag),
            data_location: Some(data_location),
        }
    }

    pub fn delete_marker() -> Self {
        Self {
            is_delete_marker: true,
            content_length: None,
            content_type: None,
            etag: None,
            data_location: None,
        }
    }
}

/// Condition the metadata layer checks before appending a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionPrecondition {
    /// Unconditional append
    None,
    /// The chain head must be this version, or the chain must be empty when `None`
    CurrentIs(Option<VersionId>),
}

/// Result of appending a version
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedVersion {
    pub version: ObjectVersion,
    /// The `null` version displaced by this write, if any
    pub replaced: Option<ObjectVersion>,
}

/// Where a version listing resumes: after every version of `key`, or after
/// `version_id` within that key's chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCursor {
    pub key: ObjectKey,
    pub version_id: Option<VersionId>,
}

impl ListingCursor {
    /// How many entries at the head of `chain` (the chain of `self.key`) were
    /// already listed. An unknown version id skips the whole chain.
    pub fn listed_in_chain(&self, chain: &[ObjectVersion]) -> usize {
        self.version_id
            .and_then(|id| chain.iter().position(|v| v.version_id == id))
            .map_or(chain.len(), |index| index + 1)
    }
}

/// A version as reported by a listing
#[derive(Debug, Clone, PartialEq)]
pub struct VersionListing {
    pub version: ObjectVersion,
    pub is_latest: bool,
}
