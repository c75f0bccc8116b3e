use crate::domain::errors::StorageError;
use std::io;
use thiserror::Error as ThisError;

/// Failures raised while building or talking to a payload backend
#[derive(ThisError, Debug)]
pub enum StoreError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Convert object_store errors to domain storage errors.
///
/// Payload locations are internal, so a missing payload means the metadata
/// and data layers disagree; none of these map to client errors.
impl From<object_store::Error> for StorageError {
    fn from(err: object_store::Error) -> Self {
        match err {
            object_store::Error::NotFound { path, .. } => StorageError::InfrastructureError {
                message: format!("Payload missing from store: {}", path),
                detail: None,
            },
            object_store::Error::NotSupported { .. } => StorageError::NotImplemented {
                operation: err.to_string(),
            },
            _ => StorageError::InfrastructureError {
                message: "Object store operation failed".to_string(),
                detail: Some(err.to_string()),
            },
        }
    }
}

/// Convert infrastructure StoreError to domain StorageError
impl From<StoreError> for StorageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ObjectStore(object_err) => object_err.into(),
            StoreError::Io(io_err) => StorageError::InfrastructureError {
                message: format!("IO operation failed: {}", io_err),
                detail: Some(io_err.to_string()),
            },
            StoreError::Other(message) => StorageError::InternalError { message },
        }
    }
}
