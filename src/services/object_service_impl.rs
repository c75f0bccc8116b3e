use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        models::{
            Action, BucketMetadata, DataLocation, DeleteObjectOutput, DeleteObjectRequest,
            GetObjectOutput, GetObjectRequest, ListVersionsRequest, ListingCursor, NewVersion,
            ObjectHead, ObjectVersion, PutObjectOutput, PutObjectRequest, RequestContext,
            VersionListing, VersionPrecondition, md5_hex,
        },
        value_objects::{ObjectKey, VersionId},
        versioning::{
            DeleteOptions, DeleteOutcome, echoed_version_id, preprocess_delete, resolve_for_read,
        },
    },
    ports::{
        metrics::{MetricEvent, MetricSink},
        repositories::ObjectRepository,
        services::ObjectService,
        storage::ObjectDataStore,
    },
};

/// Implementation of ObjectService sequencing the metadata layer, the data
/// store and the metric sink
#[derive(Clone)]
pub struct ObjectServiceImpl {
    repository: Arc<dyn ObjectRepository>,
    store: Arc<dyn ObjectDataStore>,
    metrics: Arc<dyn MetricSink>,
}

impl ObjectServiceImpl {
    /// Create a new ObjectServiceImpl instance
    pub fn new(
        repository: Arc<dyn ObjectRepository>,
        store: Arc<dyn ObjectDataStore>,
        metrics: Arc<dyn MetricSink>,
    ) -> Self {
        Self {
            repository,
            store,
            metrics,
        }
    }

    /// Payloads are immutable and never shared between versions, so a failed
    /// cleanup only leaks storage.
    async fn discard_data(&self, location: Option<&DataLocation>) {
        if let Some(location) = location {
            if let Err(err) = self.store.delete_data(location).await {
                warn!(location = location.as_str(), error = %err, "failed to delete payload");
            }
        }
    }

    async fn remove_version(
        &self,
        bucket: &BucketMetadata,
        key: &ObjectKey,
        options: &DeleteOptions,
        requested: Option<&VersionId>,
    ) -> StorageResult<DeleteObjectOutput> {
        let removed = self
            .repository
            .delete_version(&bucket.name, key, options)
            .await?;
        self.discard_data(removed.data_location.as_ref()).await;

        debug!(
            bucket = %bucket.name,
            key = %key,
            version_id = %removed.version_id,
            delete_marker = removed.is_delete_marker,
            "removed version"
        );
        self.metrics.emit(MetricEvent::delete_object(
            &bucket.name,
            key,
            removed.byte_length(),
        ));

        Ok(DeleteObjectOutput {
            delete_marker: removed.is_delete_marker,
            version_id: requested.map(|_| removed.version_id),
        })
    }

    async fn create_delete_marker(
        &self,
        bucket: &BucketMetadata,
        key: &ObjectKey,
        current: Option<&ObjectVersion>,
    ) -> StorageResult<DeleteObjectOutput> {
        let precondition = VersionPrecondition::CurrentIs(current.map(|v| v.version_id));
        let created = self
            .repository
            .create_version(
                &bucket.name,
                key,
                bucket.versioning,
                NewVersion::delete_marker(),
                precondition,
            )
            .await?;

        let replaced = created.replaced.as_ref();
        self.discard_data(replaced.and_then(|v| v.data_location.as_ref()))
            .await;

        debug!(
            bucket = %bucket.name,
            key = %key,
            version_id = %created.version.version_id,
            "created delete marker"
        );
        self.metrics.emit(MetricEvent::put_object(
            &bucket.name,
            key,
            0,
            replaced.map(|v| v.byte_length()),
        ));

        Ok(DeleteObjectOutput {
            delete_marker: true,
            version_id: Some(created.version.version_id),
        })
    }

    async fn resolve(
        &self,
        context: &RequestContext,
        request: &GetObjectRequest,
    ) -> StorageResult<(ObjectVersion, ObjectHead)> {
        let requested = request.version_id.as_ref();
        let (bucket, object) = self
            .repository
            .validate_bucket_and_object(
                &request.bucket,
                &request.key,
                requested,
                context,
                Action::GetObject,
            )
            .await?;

        let version = resolve_for_read(&bucket, &request.key, object.as_ref(), requested)?;
        let head = ObjectHead {
            content_length: version.byte_length(),
            content_type: version.content_type.clone(),
            etag: version.etag.clone(),
            last_modified: version.last_modified,
            version_id: echoed_version_id(&bucket, &version, requested),
        };
        Ok((version, head))
    }
}

#[async_trait]
impl ObjectService for ObjectServiceImpl {
    async fn put_object(
        &self,
        context: &RequestContext,
        request: PutObjectRequest,
    ) -> StorageResult<PutObjectOutput> {
        let (bucket, _) = self
            .repository
            .validate_bucket_and_object(
                &request.bucket,
                &request.key,
                None,
                context,
                Action::PutObject,
            )
            .await?;

        let content_length = request.data.len() as u64;
        let etag = md5_hex(&request.data);
        let location = DataLocation::generate(&bucket.name, &request.key);
        self.store.put_data(&location, request.data).await?;

        let version = NewVersion::object(
            content_length,
            request.content_type,
            etag.clone(),
            location.clone(),
        );
        let created = match self
            .repository
            .create_version(
                &bucket.name,
                &request.key,
                bucket.versioning,
                version,
                VersionPrecondition::None,
            )
            .await
        {
            Ok(created) => created,
            Err(err) => {
                self.discard_data(Some(&location)).await;
                return Err(err);
            }
        };

        let replaced = created.replaced.as_ref();
        self.discard_data(replaced.and_then(|v| v.data_location.as_ref()))
            .await;
        self.metrics.emit(MetricEvent::put_object(
            &bucket.name,
            &request.key,
            content_length,
            replaced.map(|v| v.byte_length()),
        ));

        Ok(PutObjectOutput {
            etag,
            version_id: bucket
                .versioning
                .is_configured()
                .then_some(created.version.version_id),
        })
    }

    async fn get_object(
        &self,
        context: &RequestContext,
        request: GetObjectRequest,
    ) -> StorageResult<GetObjectOutput> {
        let (version, head) = self.resolve(context, &request).await?;

        let location = version
            .data_location
            .as_ref()
            .ok_or_else(|| StorageError::InternalError {
                message: format!("version {} of {} has no payload", version.version_id, version.key),
            })?;
        let data = self.store.get_data(location).await?;

        Ok(GetObjectOutput { head, data })
    }

    async fn head_object(
        &self,
        context: &RequestContext,
        request: GetObjectRequest,
    ) -> StorageResult<ObjectHead> {
        self.resolve(context, &request).await.map(|(_, head)| head)
    }

    async fn delete_object(
        &self,
        context: &RequestContext,
        request: DeleteObjectRequest,
    ) -> StorageResult<DeleteObjectOutput> {
        let requested = request.version_id.as_ref();
        let (bucket, object) = self
            .repository
            .validate_bucket_and_object(
                &request.bucket,
                &request.key,
                requested,
                context,
                Action::DeleteObject,
            )
            .await?;

        match preprocess_delete(&bucket, &request.key, object.as_ref(), requested)? {
            DeleteOutcome::Skip => {
                debug!(
                    bucket = %bucket.name,
                    key = %request.key,
                    "version to delete does not exist, nothing to do"
                );
                Ok(DeleteObjectOutput::default())
            }
            DeleteOutcome::Proceed(options) if options.delete_data => {
                self.remove_version(&bucket, &request.key, &options, requested)
                    .await
            }
            DeleteOutcome::Proceed(_) => {
                self.create_delete_marker(&bucket, &request.key, object.as_ref())
                    .await
            }
        }
    }

    async fn list_object_versions(
        &self,
        context: &RequestContext,
        request: ListVersionsRequest,
    ) -> StorageResult<Vec<VersionListing>> {
        let bucket = self
            .repository
            .get_bucket(&request.bucket)
            .await?
            .ok_or_else(|| StorageError::NoSuchBucket {
                bucket: request.bucket.clone(),
            })?;
        bucket.check_access(context, Action::ListObjectVersions)?;

        let cursor = match (request.key_marker, request.version_id_marker) {
            (Some(key), version_id) => Some(ListingCursor { key, version_id }),
            (None, None) => None,
            (None, Some(version_id)) => {
                return Err(StorageError::invalid_argument_value(
                    "A version-id marker cannot be specified without a key marker.",
                    "version-id-marker",
                    version_id.encode(),
                ));
            }
        };

        self.repository
            .list_versions(
                &bucket.name,
                request.prefix.as_deref(),
                cursor.as_ref(),
                request.max_keys,
            )
            .await
    }
}

/// Builder for ObjectServiceImpl
#[derive(Default)]
pub struct ObjectServiceBuilder {
    repository: Option<Arc<dyn ObjectRepository>>,
    store: Option<Arc<dyn ObjectDataStore>>,
    metrics: Option<Arc<dyn MetricSink>>,
}

impl ObjectServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repository(mut self, repository: Arc<dyn ObjectRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    pub fn store(mut self, store: Arc<dyn ObjectDataStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricSink>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> Result<ObjectServiceImpl, &'static str> {
        let repository = self.repository.ok_or("Repository is required")?;
        let store = self.store.ok_or("Store is required")?;
        let metrics = self.metrics.ok_or("Metric sink is required")?;

        Ok(ObjectServiceImpl::new(repository, store, metrics))
    }
}
