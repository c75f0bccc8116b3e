use crate::domain::{
    errors::StorageResult,
    models::{
        Action, BucketMetadata, BucketVersioning, CreatedVersion, ListingCursor, NewVersion,
        ObjectVersion, RequestContext, VersionListing, VersionPrecondition,
    },
    value_objects::{BucketName, ObjectKey, VersionId},
    versioning::DeleteOptions,
};
use async_trait::async_trait;

/// Metadata layer: buckets and per-object version chains.
///
/// Chains are only ever prepended to or have entries removed; no version is
/// rewritten in place. Mutations check their precondition atomically and
/// report a stale snapshot as `StorageError::VersionConflict`.
#[async_trait]
pub trait ObjectRepository: Send + Sync + 'static {
    /// Register a new bucket
    async fn create_bucket(&self, bucket: BucketMetadata) -> StorageResult<()>;

    /// Fetch bucket metadata
    async fn get_bucket(&self, name: &BucketName) -> StorageResult<Option<BucketMetadata>>;

    /// Replace the versioning state of a bucket
    async fn set_bucket_versioning(
        &self,
        name: &BucketName,
        versioning: BucketVersioning,
    ) -> StorageResult<BucketMetadata>;

    /// Load the bucket, check `action` against `context`, and look up the
    /// object: the named version when `version_id` is set, the chain head
    /// otherwise.
    async fn validate_bucket_and_object(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        version_id: Option<&VersionId>,
        context: &RequestContext,
        action: Action,
    ) -> StorageResult<(BucketMetadata, Option<ObjectVersion>)>;

    /// Prepend a version to the chain. The version id is minted from
    /// `versioning`; a `null` id displaces any existing `null` version.
    async fn create_version(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        versioning: BucketVersioning,
        version: NewVersion,
        precondition: VersionPrecondition,
    ) -> StorageResult<CreatedVersion>;

    /// Remove the version named by `options`, returning it
    async fn delete_version(
        &self,
        bucket: &BucketName,
        key: &ObjectKey,
        options: &DeleteOptions,
    ) -> StorageResult<ObjectVersion>;

    /// List versions ordered by key, newest first within a key, starting
    /// after `after` when given
    async fn list_versions(
        &self,
        bucket: &BucketName,
        prefix: Option<&str>,
        after: Option<&ListingCursor>,
        max_keys: usize,
    ) -> StorageResult<Vec<VersionListing>>;
}
