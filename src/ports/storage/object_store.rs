use bytes::Bytes;

use crate::domain::{errors::StorageResult, models::DataLocation};
use async_trait::async_trait;

/// Port for payload storage.
/// Versions reference their bytes through an opaque [`DataLocation`]; the
/// store knows nothing about keys or versions.
#[async_trait]
pub trait ObjectDataStore: Send + Sync + 'static {
    /// Store a payload
    async fn put_data(&self, location: &DataLocation, data: Bytes) -> StorageResult<()>;

    /// Retrieve a payload
    async fn get_data(&self, location: &DataLocation) -> StorageResult<Bytes>;

    /// Delete a payload; deleting a missing payload is not an error
    async fn delete_data(&self, location: &DataLocation) -> StorageResult<()>;
}
