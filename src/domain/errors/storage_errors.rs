use http::StatusCode;
use thiserror::Error;

use crate::domain::{
    errors::ValidationError,
    value_objects::{BucketName, ObjectKey, VersionId},
};

/// Message returned when a version id is supplied to an operation that always
/// targets the current version.
pub const VERSION_ID_NOT_ACCEPTED: &str = "This operation does not accept a version-id.";

/// Message returned when a version id token cannot be decoded.
pub const INVALID_VERSION_ID: &str = "Invalid version id specified";

/// Errors surfaced by the versioning core and its collaborators.
///
/// Each variant carries its S3 error code and HTTP status so the inbound
/// adapter can render it without reinterpreting it.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Access Denied")]
    AccessDenied { bucket: BucketName, operation: String },

    #[error("The specified bucket does not exist")]
    NoSuchBucket { bucket: BucketName },

    #[error("The specified key does not exist.")]
    NoSuchKey {
        bucket: BucketName,
        key: ObjectKey,
    },

    #[error("The specified method is not allowed against this resource.")]
    MethodNotAllowed {
        bucket: BucketName,
        key: ObjectKey,
        version_id: VersionId,
    },

    #[error("{message}")]
    InvalidArgument {
        message: String,
        argument: Option<(String, String)>,
    },

    #[error("The XML you provided was not well-formed or did not validate against our published schema")]
    MalformedXml { reason: String },

    #[error("The requested bucket name is not available")]
    BucketAlreadyExists { bucket: BucketName },

    /// The metadata snapshot a mutation was planned from is stale
    #[error(
        "A conflicting conditional operation is currently in progress against this resource: {key} (expected {expected:?}, found {actual:?})"
    )]
    VersionConflict {
        key: ObjectKey,
        expected: Option<VersionId>,
        actual: Option<VersionId>,
    },

    #[error("{operation} is not implemented")]
    NotImplemented { operation: String },

    /// Infrastructure error with external source
    #[error("Infrastructure error: {message}")]
    InfrastructureError {
        message: String,
        // kept as a string so the error stays Clone
        detail: Option<String>,
    },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl StorageError {
    /// S3 error code
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::AccessDenied { .. } => "AccessDenied",
            StorageError::NoSuchBucket { .. } => "NoSuchBucket",
            StorageError::NoSuchKey { .. } => "NoSuchKey",
            StorageError::MethodNotAllowed { .. } => "MethodNotAllowed",
            StorageError::InvalidArgument { .. } => "InvalidArgument",
            StorageError::MalformedXml { .. } => "MalformedXML",
            StorageError::BucketAlreadyExists { .. } => "BucketAlreadyExists",
            StorageError::VersionConflict { .. } => "OperationAborted",
            StorageError::NotImplemented { .. } => "NotImplemented",
            StorageError::InfrastructureError { .. } | StorageError::InternalError { .. } => {
                "InternalError"
            }
        }
    }

    /// HTTP status for the error
    pub fn status_code(&self) -> StatusCode {
        match self {
            StorageError::AccessDenied { .. } => StatusCode::FORBIDDEN,
            StorageError::NoSuchBucket { .. } | StorageError::NoSuchKey { .. } => {
                StatusCode::NOT_FOUND
            }
            StorageError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            StorageError::InvalidArgument { .. } | StorageError::MalformedXml { .. } => {
                StatusCode::BAD_REQUEST
            }
            StorageError::BucketAlreadyExists { .. } | StorageError::VersionConflict { .. } => {
                StatusCode::CONFLICT
            }
            StorageError::NotImplemented { .. } => StatusCode::NOT_IMPLEMENTED,
            StorageError::InfrastructureError { .. } | StorageError::InternalError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// InvalidArgument with a custom message and no argument detail
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        StorageError::InvalidArgument {
            message: message.into(),
            argument: None,
        }
    }

    /// InvalidArgument naming the offending request argument
    pub fn invalid_argument_value(
        message: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        StorageError::InvalidArgument {
            message: message.into(),
            argument: Some((name.into(), value.into())),
        }
    }
}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        StorageError::invalid_argument(err.to_string())
    }
}

impl From<StorageError> for StatusCode {
    fn from(err: StorageError) -> Self {
        err.status_code()
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
