use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        models::{
            Action, BucketMetadata, BucketVersioning, CreatedVersion, ListingCursor, NewVersion,
            ObjectVersion, RequestContext, VersionListing, VersionPrecondition,
        },
        value_objects::{BucketName, ObjectKey, VersionId, VersionKeyGenerator},
        versioning::DeleteOptions,
    },
    ports::repositories::ObjectRepository,
};

/// In-memory implementation of ObjectRepository for testing and development
#[derive(Clone)]
pub struct InMemoryObjectRepository {
    data: Arc<RwLock<RepositoryData>>,
    generator: Arc<VersionKeyGenerator>,
}

#[derive(Default)]
struct RepositoryData {
    buckets: HashMap<BucketName, StoredBucket>,
}

struct StoredBucket {
    metadata: BucketMetadata,
    // Version chains, newest first
    objects: BTreeMap<ObjectKey, Vec<ObjectVersion>>,
}

impl RepositoryData {
    fn bucket(&self, name: &BucketName) -> StorageResult<&StoredBucket> {
        self.buckets
            .get(name)
            .ok_or_else(|| StorageError::NoSuchBucket {
                bucket: name.clone(),
            })
    }

    fn bucket_mut(&mut self, name: &BucketName) -> StorageResult<&mut StoredBucket> {
        self.buckets
            .get_mut(name)
            .ok_or_else(|| StorageError::NoSuchBucket {
                bucket: name.clone(),
            })
    }
}

impl InMemoryObjectRepository {
    pub fn new() -> Self {
        Self::with_generator(VersionKeyGenerator::default())
    }

    /// Mint version ids with the given generator
    pub fn with_generator(generator: VersionKeyGenerator) -> Self {
        Self {
            data: Arc::new(RwLock::new(RepositoryData::default())),
            generator: Arc::new(generator),
        }
    }
}

impl Default for InMemoryObjectRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectRepository for InMemoryObjectRepository {
    async fn create_bucket(&self, bucket: BucketMetadata) -> StorageResult<()> {
        let mut data = self.data.write().await;

        if data.buckets.contains_key(&bucket.name) {
            return Err(StorageError::BucketAlreadyExists {
                bucket: bucket.name,
            });
        }

        data.buckets.insert(
            bucket.name.clone(),
            StoredBucket {
                metadata: bucket,
                objects: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn get_bucket(&self, name: &BucketName) -> StorageResult<Option<BucketMetadata>> {
        let data = self.data.read().await;
        Ok(data.buckets.get(name).map(|b| b.metadata.clone()))
    }

    async fn set_bucket_versioning(
        &self,
        name: &BucketName,
        versioning: BucketVersioning,
    ) -> StorageResult<BucketMetadata> {
        let mut data = self.data.write().await;
        let bucket = data.bucket_mut(name)?;
        bucket.metadata.versioning = versioning;
        Ok(bucket.metadata.clone())
    }

    async fn validate_bucket_and_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        version_id: Option<&VersionId>,
        context: &RequestContext,
        action: Action,
    ) -> StorageResult<(BucketMetadata, Option<ObjectVersion>)> {
        let data = self.data.read().await;
        let stored = data.bucket(bucket)?;
        stored.metadata.check_access(context, action)?;

        let chain = stored.objects.get(key).map(Vec::as_slice).unwrap_or_default();
        let object = match version_id {
            Some(id) => chain.iter().find(|v| v.version_id == *id),
            None => chain.first(),
        };

        Ok((stored.metadata.clone(), object.cloned()))
    }

    async fn create_version(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        versioning: BucketVersioning,
        version: NewVersion,
        precondition: VersionPrecondition,
    ) -> StorageResult<CreatedVersion> {
        let mut data = self.data.write().await;
        let stored = data.bucket_mut(bucket)?;

        if let VersionPrecondition::CurrentIs(expected) = precondition {
            let actual = stored
                .objects
                .get(key)
                .and_then(|chain| chain.first())
                .map(|v| v.version_id);
            if actual != expected {
                return Err(StorageError::VersionConflict {
                    key: key.clone(),
                    expected,
                    actual,
                });
            }
        }

        let chain = stored.objects.entry(key.clone()).or_default();

        // minted under the write lock so chain order follows key order
        let version_id = if versioning.mints_version_ids() {
            self.generator.next_version_id()
        } else {
            VersionId::Null
        };

        let replaced = if version_id.is_null() {
            chain
                .iter()
                .position(|v| v.version_id.is_null())
                .map(|index| chain.remove(index))
        } else {
            None
        };

        let created = ObjectVersion {
            bucket: bucket.clone(),
            key: key.clone(),
            version_id,
            is_delete_marker: version.is_delete_marker,
            content_length: version.content_length,
            content_type: version.content_type,
            etag: version.etag,
            data_location: version.data_location,
            last_modified: chrono::Utc::now(),
        };
        chain.insert(0, created.clone());

        Ok(CreatedVersion {
            version: created,
            replaced,
        })
    }

    async fn delete_version(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        options: &DeleteOptions,
    ) -> StorageResult<ObjectVersion> {
        let version_id = options
            .version_id
            .ok_or_else(|| StorageError::InternalError {
                message: "physical delete without a version id".to_string(),
            })?;

        let mut data = self.data.write().await;
        let stored = data.bucket_mut(bucket)?;

        let conflict = |chain: Option<&Vec<ObjectVersion>>| StorageError::VersionConflict {
            key: key.clone(),
            expected: Some(version_id),
            actual: chain.and_then(|c| c.first()).map(|v| v.version_id),
        };

        let Some(chain) = stored.objects.get_mut(key) else {
            return Err(conflict(None));
        };
        let Some(index) = chain.iter().position(|v| v.version_id == version_id) else {
            return Err(conflict(Some(&*chain)));
        };

        let removed = chain.remove(index);
        if chain.is_empty() {
            stored.objects.remove(key);
        }
        Ok(removed)
    }

    async fn list_versions(
        &self,
        bucket: &BucketName,
        prefix: Option<&str>,
        after: Option<&ListingCursor>,
        max_keys: usize,
    ) -> StorageResult<Vec<VersionListing>> {
        let data = self.data.read().await;
        let stored = data.bucket(bucket)?;

        let lower = after.map_or(Bound::Unbounded, |cursor| Bound::Included(cursor.key.clone()));

        Ok(stored
            .objects
            .range((lower, Bound::Unbounded))
            .filter(|(key, _)| prefix.map_or(true, |p| key.has_prefix(p)))
            .flat_map(|(key, chain)| {
                let listed = match after {
                    Some(cursor) if cursor.key == *key => cursor.listed_in_chain(chain),
                    _ => 0,
                };
                chain
                    .iter()
                    .enumerate()
                    .skip(listed)
                    .map(|(index, version)| VersionListing {
                        version: version.clone(),
                        is_latest: index == 0,
                    })
            })
            .take(max_keys)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CannedAcl, DataLocation};

    const OWNER: &str = "AKIDOWNER";

    fn bucket_name() -> BucketName {
        BucketName::try_from("versions").unwrap()
    }

    fn key(name: &str) -> ObjectKey {
        ObjectKey::try_from(name).unwrap()
    }

    fn payload(size: u64) -> NewVersion {
        NewVersion::object(
            size,
            None,
            "etag".to_string(),
            DataLocation::generate(&bucket_name(), &key("a")),
        )
    }

    async fn repository() -> InMemoryObjectRepository {
        let repository = InMemoryObjectRepository::new();
        repository
            .create_bucket(BucketMetadata::new(bucket_name(), OWNER, CannedAcl::Private))
            .await
            .unwrap();
        repository
    }

    #[tokio::test]
    async fn test_duplicate_bucket_is_rejected() {
        let repository = repository().await;
        let err = repository
            .create_bucket(BucketMetadata::new(bucket_name(), OWNER, CannedAcl::Private))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "BucketAlreadyExists");
    }

    #[tokio::test]
    async fn test_null_version_replaces_previous_null() {
        let repository = repository().await;
        let bucket = bucket_name();
        let key = key("a");

        repository
            .create_version(&bucket, &key, BucketVersioning::Disabled, payload(3), VersionPrecondition::None)
            .await
            .unwrap();
        let keyed = repository
            .create_version(&bucket, &key, BucketVersioning::Enabled, payload(4), VersionPrecondition::None)
            .await
            .unwrap();
        let second_null = repository
            .create_version(&bucket, &key, BucketVersioning::Suspended, payload(5), VersionPrecondition::None)
            .await
            .unwrap();

        assert_eq!(second_null.version.version_id, VersionId::Null);
        assert_eq!(second_null.replaced.unwrap().byte_length(), 3);

        let listing = repository.list_versions(&bucket, None, None, 100).await.unwrap();
        let ids: Vec<_> = listing.iter().map(|l| l.version.version_id).collect();
        assert_eq!(ids, vec![VersionId::Null, keyed.version.version_id]);
        assert!(listing[0].is_latest);
        assert!(!listing[1].is_latest);
    }

    #[tokio::test]
    async fn test_stale_precondition_conflicts() {
        let repository = repository().await;
        let bucket = bucket_name();
        let key = key("a");

        repository
            .create_version(&bucket, &key, BucketVersioning::Enabled, payload(1), VersionPrecondition::None)
            .await
            .unwrap();

        let err = repository
            .create_version(
                &bucket,
                &key,
                BucketVersioning::Enabled,
                NewVersion::delete_marker(),
                VersionPrecondition::CurrentIs(None),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "OperationAborted");
    }

    #[tokio::test]
    async fn test_delete_of_vanished_version_conflicts() {
        let repository = repository().await;
        let bucket = bucket_name();
        let key = key("a");

        let created = repository
            .create_version(&bucket, &key, BucketVersioning::Enabled, payload(1), VersionPrecondition::None)
            .await
            .unwrap();
        let options = DeleteOptions {
            delete_data: true,
            version_id: Some(created.version.version_id),
            removes_delete_marker: false,
        };

        let removed = repository.delete_version(&bucket, &key, &options).await.unwrap();
        assert_eq!(removed.version_id, created.version.version_id);

        let err = repository
            .delete_version(&bucket, &key, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::VersionConflict { .. }));
    }

    #[tokio::test]
    async fn test_lookup_and_listing_filters() {
        let repository = repository().await;
        let bucket = bucket_name();

        for name in ["logs/1", "logs/2", "images/1"] {
            repository
                .create_version(&bucket, &key(name), BucketVersioning::Enabled, payload(1), VersionPrecondition::None)
                .await
                .unwrap();
        }

        let listing = repository
            .list_versions(&bucket, Some("logs/"), None, 100)
            .await
            .unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].version.key, key("logs/1"));

        let (_, missing) = repository
            .validate_bucket_and_object(
                &bucket,
                &key("logs/3"),
                None,
                &RequestContext::account(OWNER),
                Action::GetObject,
            )
            .await
            .unwrap();
        assert!(missing.is_none());

        let err = repository
            .validate_bucket_and_object(
                &bucket,
                &key("logs/1"),
                None,
                &RequestContext::anonymous(),
                Action::GetObject,
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "AccessDenied");
    }

    #[tokio::test]
    async fn test_listing_resumes_after_cursor() {
        let repository = repository().await;
        let bucket = bucket_name();

        let mut ids = Vec::new();
        for name in ["a", "a", "b"] {
            let created = repository
                .create_version(&bucket, &key(name), BucketVersioning::Enabled, payload(1), VersionPrecondition::None)
                .await
                .unwrap();
            ids.push(created.version.version_id);
        }

        // inside a chain: the older version of "a" is next
        let cursor = ListingCursor {
            key: key("a"),
            version_id: Some(ids[1]),
        };
        let page = repository
            .list_versions(&bucket, None, Some(&cursor), 100)
            .await
            .unwrap();
        let listed: Vec<_> = page.iter().map(|l| l.version.version_id).collect();
        assert_eq!(listed, vec![ids[0], ids[2]]);
        assert!(!page[0].is_latest);

        // key only: the whole chain of "a" is skipped
        let cursor = ListingCursor {
            key: key("a"),
            version_id: None,
        };
        let page = repository
            .list_versions(&bucket, None, Some(&cursor), 100)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].version.key, key("b"));
    }
}
