use crate::domain::{
    errors::{StorageError, StorageResult},
    models::{BucketMetadata, ObjectVersion},
    value_objects::{ObjectKey, VersionId},
};

/// Classification of the version returned by a metadata lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    Missing,
    Ordinary(&'a ObjectVersion),
    DeleteMarker(&'a ObjectVersion),
}

pub fn classify(object: Option<&ObjectVersion>) -> Resolution<'_> {
    match object {
        None => Resolution::Missing,
        Some(version) if version.is_delete_marker => Resolution::DeleteMarker(version),
        Some(version) => Resolution::Ordinary(version),
    }
}

/// Decide what a GET or HEAD returns for the looked-up version.
///
/// A delete marker named explicitly is a valid target that cannot be read
/// (405); the same marker reached as the current version means the object is
/// gone (404).
pub fn resolve_for_read(
    bucket: &BucketMetadata,
    key: &ObjectKey,
    object: Option<&ObjectVersion>,
    requested: Option<&VersionId>,
) -> StorageResult<ObjectVersion> {
    let no_such_key = || StorageError::NoSuchKey {
        bucket: bucket.name.clone(),
        key: key.clone(),
    };

    match classify(object) {
        Resolution::Missing => Err(no_such_key()),
        Resolution::DeleteMarker(marker) => match requested {
            Some(_) => Err(StorageError::MethodNotAllowed {
                bucket: bucket.name.clone(),
                key: key.clone(),
                version_id: marker.version_id,
            }),
            None => Err(no_such_key()),
        },
        Resolution::Ordinary(version) => Ok(version.clone()),
    }
}

/// Version id to echo in `x-amz-version-id` for a read
pub fn echoed_version_id(
    bucket: &BucketMetadata,
    version: &ObjectVersion,
    requested: Option<&VersionId>,
) -> Option<VersionId> {
    if bucket.versioning.is_configured() || requested.is_some() {
        Some(version.version_id)
    } else {
        None
    }
}
