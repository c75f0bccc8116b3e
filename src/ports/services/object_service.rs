use crate::domain::{
    errors::StorageResult,
    models::{
        DeleteObjectOutput, DeleteObjectRequest, GetObjectOutput, GetObjectRequest, ObjectHead,
        ListVersionsRequest, PutObjectOutput, PutObjectRequest, RequestContext, VersionListing,
    },
};
use async_trait::async_trait;

/// Port for object operations on versioned buckets.
/// Every call is checked against the bucket ACL for `context`.
#[async_trait]
pub trait ObjectService: Send + Sync + 'static {
    /// Store a new version of an object
    async fn put_object(
        &self,
        context: &RequestContext,
        request: PutObjectRequest,
    ) -> StorageResult<PutObjectOutput>;

    /// Read an object, the current version unless one is requested
    async fn get_object(
        &self,
        context: &RequestContext,
        request: GetObjectRequest,
    ) -> StorageResult<GetObjectOutput>;

    /// Like [`ObjectService::get_object`] without fetching the payload
    async fn head_object(
        &self,
        context: &RequestContext,
        request: GetObjectRequest,
    ) -> StorageResult<ObjectHead>;

    /// Delete an object (creating a delete marker on versioned buckets) or
    /// permanently remove one version
    async fn delete_object(
        &self,
        context: &RequestContext,
        request: DeleteObjectRequest,
    ) -> StorageResult<DeleteObjectOutput>;

    /// List all versions and delete markers in a bucket
    async fn list_object_versions(
        &self,
        context: &RequestContext,
        request: ListVersionsRequest,
    ) -> StorageResult<Vec<VersionListing>>;
}
