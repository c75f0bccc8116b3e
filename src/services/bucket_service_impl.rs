use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::{
    domain::{
        errors::{StorageError, StorageResult},
        models::{Action, BucketMetadata, BucketVersioning, CannedAcl, RequestContext, Requester},
        value_objects::BucketName,
    },
    ports::{repositories::ObjectRepository, services::BucketService},
};

/// Implementation of BucketService
#[derive(Clone)]
pub struct BucketServiceImpl {
    repository: Arc<dyn ObjectRepository>,
}

impl BucketServiceImpl {
    pub fn new(repository: Arc<dyn ObjectRepository>) -> Self {
        Self { repository }
    }

    async fn authorized_bucket(
        &self,
        context: &RequestContext,
        bucket: &BucketName,
        action: Action,
    ) -> StorageResult<BucketMetadata> {
        let metadata = self
            .repository
            .get_bucket(bucket)
            .await?
            .ok_or_else(|| StorageError::NoSuchBucket {
                bucket: bucket.clone(),
            })?;
        metadata.check_access(context, action)?;
        Ok(metadata)
    }
}

#[async_trait]
impl BucketService for BucketServiceImpl {
    async fn create_bucket(
        &self,
        context: &RequestContext,
        bucket: BucketName,
        acl: CannedAcl,
    ) -> StorageResult<BucketMetadata> {
        let Requester::Account(owner) = &context.requester else {
            return Err(StorageError::AccessDenied {
                bucket,
                operation: "CreateBucket".to_string(),
            });
        };

        let metadata = BucketMetadata::new(bucket, owner.clone(), acl);
        self.repository.create_bucket(metadata.clone()).await?;
        info!(bucket = %metadata.name, owner = %metadata.owner, "created bucket");
        Ok(metadata)
    }

    async fn get_bucket_versioning(
        &self,
        context: &RequestContext,
        bucket: &BucketName,
    ) -> StorageResult<BucketVersioning> {
        self.authorized_bucket(context, bucket, Action::GetBucketVersioning)
            .await
            .map(|metadata| metadata.versioning)
    }

    async fn put_bucket_versioning(
        &self,
        context: &RequestContext,
        bucket: &BucketName,
        versioning: BucketVersioning,
    ) -> StorageResult<BucketVersioning> {
        // versioning can be suspended but never switched back off
        if !versioning.is_configured() {
            return Err(StorageError::MalformedXml {
                reason: "versioning status must be Enabled or Suspended".to_string(),
            });
        }

        self.authorized_bucket(context, bucket, Action::PutBucketVersioning)
            .await?;
        let updated = self
            .repository
            .set_bucket_versioning(bucket, versioning)
            .await?;
        info!(bucket = %bucket, status = ?updated.versioning, "updated bucket versioning");
        Ok(updated.versioning)
    }
}
