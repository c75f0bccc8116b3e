use crate::domain::{
    errors::StorageResult,
    models::{BucketMetadata, BucketVersioning, CannedAcl, RequestContext},
    value_objects::BucketName,
};
use async_trait::async_trait;

/// Service port for bucket creation and versioning configuration
#[async_trait]
pub trait BucketService: Send + Sync + 'static {
    /// Create a bucket owned by the requester
    async fn create_bucket(
        &self,
        context: &RequestContext,
        bucket: BucketName,
        acl: CannedAcl,
    ) -> StorageResult<BucketMetadata>;

    /// Get the versioning state of a bucket
    async fn get_bucket_versioning(
        &self,
        context: &RequestContext,
        bucket: &BucketName,
    ) -> StorageResult<BucketVersioning>;

    /// Enable or suspend versioning
    async fn put_bucket_versioning(
        &self,
        context: &RequestContext,
        bucket: &BucketName,
        versioning: BucketVersioning,
    ) -> StorageResult<BucketVersioning>;
}
