use async_trait::async_trait;
use bytes::Bytes;
use object_store::{
    ObjectStore as ApacheObjectStore, PutPayload, aws::AmazonS3Builder,
    local::LocalFileSystem, memory::InMemory, path::Path as ObjectPath,
};
use std::{path::Path, sync::Arc};

use crate::{
    adapters::outbound::storage::error::StoreError,
    domain::{errors::StorageResult, models::DataLocation},
    ports::storage::ObjectDataStore,
};

/// Settings for an S3-compatible payload backend
#[derive(Debug, Clone)]
pub struct S3StoreSettings {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub allow_http: bool,
}

/// Adapter that implements ObjectDataStore using Apache object_store
pub struct ApacheObjectStoreAdapter {
    inner: Arc<dyn ApacheObjectStore>,
}

impl ApacheObjectStoreAdapter {
    pub fn new(store: Arc<dyn ApacheObjectStore>) -> Self {
        Self { inner: store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()))
    }

    /// Payloads under `root` on the local filesystem, creating it if needed
    pub fn local(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        std::fs::create_dir_all(root.as_ref())?;
        let store = LocalFileSystem::new_with_prefix(root.as_ref())?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn s3(settings: &S3StoreSettings) -> Result<Self, StoreError> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&settings.bucket)
            .with_region(&settings.region)
            .with_allow_http(settings.allow_http);

        if let Some(endpoint) = &settings.endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        if let (Some(access_key), Some(secret_key)) = (&settings.access_key, &settings.secret_key)
        {
            builder = builder
                .with_access_key_id(access_key)
                .with_secret_access_key(secret_key);
        }

        Ok(Self::new(Arc::new(builder.build()?)))
    }

    fn path(location: &DataLocation) -> ObjectPath {
        ObjectPath::from(location.as_str())
    }
}

#[async_trait]
impl ObjectDataStore for ApacheObjectStoreAdapter {
    async fn put_data(&self, location: &DataLocation, data: Bytes) -> StorageResult<()> {
        self.inner
            .put(&Self::path(location), PutPayload::from(data))
            .await?;
        Ok(())
    }

    async fn get_data(&self, location: &DataLocation) -> StorageResult<Bytes> {
        let result = self.inner.get(&Self::path(location)).await?;
        Ok(result.bytes().await?)
    }

    async fn delete_data(&self, location: &DataLocation) -> StorageResult<()> {
        match self.inner.delete(&Self::path(location)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
