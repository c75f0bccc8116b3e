use crate::domain::{
    errors::{StorageError, StorageResult},
    models::{BucketMetadata, ObjectVersion},
    value_objects::{ObjectKey, VersionId},
    versioning::resolution::{Resolution, classify},
};

/// Instructions for the metadata layer produced by [`preprocess_delete`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOptions {
    /// `true` removes a version, `false` appends a delete marker
    pub delete_data: bool,
    /// The version to remove when `delete_data` is set
    pub version_id: Option<VersionId>,
    /// The removed version is itself a delete marker
    pub removes_delete_marker: bool,
}

impl DeleteOptions {
    fn remove(version: &ObjectVersion) -> Self {
        Self {
            delete_data: true,
            version_id: Some(version.version_id),
            removes_delete_marker: version.is_delete_marker,
        }
    }

    fn create_delete_marker() -> Self {
        Self {
            delete_data: false,
            version_id: None,
            removes_delete_marker: false,
        }
    }
}

/// What a DELETE request amounts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Valid request that changes nothing
    Skip,
    Proceed(DeleteOptions),
}

/// Decide what a DELETE does from the bucket's versioning state, the looked-up
/// version and the version id the client asked for.
///
/// | versioning | requested id | found            | outcome                |
/// |------------|--------------|------------------|------------------------|
/// | disabled   | any          | yes              | remove it              |
/// | disabled   | any          | no               | `NoSuchKey`            |
/// | configured | absent       | any              | append a delete marker |
/// | configured | present      | yes              | remove it              |
/// | configured | present      | no               | skip                   |
pub fn preprocess_delete(
    bucket: &BucketMetadata,
    key: &ObjectKey,
    object: Option<&ObjectVersion>,
    requested: Option<&VersionId>,
) -> StorageResult<DeleteOutcome> {
    let resolution = classify(object);

    if !bucket.versioning.is_configured() {
        return match resolution {
            Resolution::Ordinary(version) | Resolution::DeleteMarker(version) => {
                Ok(DeleteOutcome::Proceed(DeleteOptions::remove(version)))
            }
            Resolution::Missing => Err(StorageError::NoSuchKey {
                bucket: bucket.name.clone(),
                key: key.clone(),
            }),
        };
    }

    match (requested, resolution) {
        // Deleting the current version never removes data: a marker goes on
        // top, even when there is nothing (or only a marker) underneath.
        (None, _) => Ok(DeleteOutcome::Proceed(DeleteOptions::create_delete_marker())),
        (Some(_), Resolution::Ordinary(version) | Resolution::DeleteMarker(version)) => {
            Ok(DeleteOutcome::Proceed(DeleteOptions::remove(version)))
        }
        (Some(_), Resolution::Missing) => Ok(DeleteOutcome::Skip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        models::{BucketVersioning, CannedAcl},
        value_objects::{BucketName, VersionKeyGenerator},
    };

    fn bucket(versioning: BucketVersioning) -> BucketMetadata {
        let mut bucket =
            BucketMetadata::new(BucketName::try_from("ledger").unwrap(), "AKID", CannedAcl::Private);
        bucket.versioning = versioning;
        bucket
    }

    fn key() -> ObjectKey {
        ObjectKey::try_from("entries/2024.json").unwrap()
    }

    fn version(version_id: VersionId, is_delete_marker: bool) -> ObjectVersion {
        ObjectVersion {
            bucket: BucketName::try_from("ledger").unwrap(),
            key: key(),
            version_id,
            is_delete_marker,
            content_length: (!is_delete_marker).then_some(12),
            content_type: None,
            etag: None,
            data_location: None,
            last_modified: chrono::Utc::now(),
        }
    }

    fn marker_creation() -> DeleteOutcome {
        DeleteOutcome::Proceed(DeleteOptions {
            delete_data: false,
            version_id: None,
            removes_delete_marker: false,
        })
    }

    #[test]
    fn test_unversioned_bucket_removes_object() {
        let current = version(VersionId::Null, false);
        let outcome =
            preprocess_delete(&bucket(BucketVersioning::Disabled), &key(), Some(&current), None)
                .unwrap();

        assert_eq!(
            outcome,
            DeleteOutcome::Proceed(DeleteOptions {
                delete_data: true,
                version_id: Some(VersionId::Null),
                removes_delete_marker: false,
            })
        );
    }

    #[test]
    fn test_unversioned_bucket_missing_object_is_no_such_key() {
        let err = preprocess_delete(&bucket(BucketVersioning::Disabled), &key(), None, None)
            .unwrap_err();
        assert_eq!(err.code(), "NoSuchKey");

        let err = preprocess_delete(
            &bucket(BucketVersioning::Disabled),
            &key(),
            None,
            Some(&VersionId::Null),
        )
        .unwrap_err();
        assert_eq!(err.code(), "NoSuchKey");
    }

    #[test]
    fn test_implicit_delete_always_creates_marker() {
        let generator = VersionKeyGenerator::default();
        let ordinary = version(generator.next_version_id(), false);
        let marker = version(generator.next_version_id(), true);

        for versioning in [BucketVersioning::Enabled, BucketVersioning::Suspended] {
            let bucket = bucket(versioning);
            assert_eq!(
                preprocess_delete(&bucket, &key(), Some(&ordinary), None).unwrap(),
                marker_creation()
            );
            assert_eq!(
                preprocess_delete(&bucket, &key(), Some(&marker), None).unwrap(),
                marker_creation()
            );
            assert_eq!(
                preprocess_delete(&bucket, &key(), None, None).unwrap(),
                marker_creation()
            );
        }
    }

    #[test]
    fn test_explicit_delete_of_marker_flags_marker_removal() {
        let id = VersionKeyGenerator::default().next_version_id();
        let marker = version(id, true);

        let outcome =
            preprocess_delete(&bucket(BucketVersioning::Enabled), &key(), Some(&marker), Some(&id))
                .unwrap();

        assert_eq!(
            outcome,
            DeleteOutcome::Proceed(DeleteOptions {
                delete_data: true,
                version_id: Some(id),
                removes_delete_marker: true,
            })
        );
    }

    #[test]
    fn test_explicit_delete_of_missing_version_skips() {
        let id = VersionKeyGenerator::default().next_version_id();

        for versioning in [BucketVersioning::Enabled, BucketVersioning::Suspended] {
            assert_eq!(
                preprocess_delete(&bucket(versioning), &key(), None, Some(&id)).unwrap(),
                DeleteOutcome::Skip
            );
        }
    }
}
