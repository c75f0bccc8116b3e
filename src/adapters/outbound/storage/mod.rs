// Infrastructure error types
pub mod error;

pub mod apache_object_store_adapter;

// Re-export key types
pub use apache_object_store_adapter::{ApacheObjectStoreAdapter, S3StoreSettings};
pub use error::StoreError;
