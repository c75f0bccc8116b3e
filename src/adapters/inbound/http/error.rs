use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{error, warn};

use crate::{
    adapters::inbound::http::{
        dto::{ErrorResponseDto, to_xml},
        middleware::RequestScope,
    },
    domain::errors::StorageError,
};

pub const VERSION_ID_HEADER: &str = "x-amz-version-id";
pub const DELETE_MARKER_HEADER: &str = "x-amz-delete-marker";

/// A [`StorageError`] bound to the request it failed
#[derive(Debug)]
pub struct ApiError {
    pub error: StorageError,
    pub resource: String,
    pub request_id: String,
}

impl ApiError {
    pub fn new(error: StorageError, scope: &RequestScope) -> Self {
        Self {
            error,
            resource: scope.resource.clone(),
            request_id: scope.request_id.clone(),
        }
    }
}

/// Shorthand for `map_err` in handlers
pub trait ScopedResult<T> {
    fn scoped(self, scope: &RequestScope) -> Result<T, ApiError>;
}

impl<T, E: Into<StorageError>> ScopedResult<T> for Result<T, E> {
    fn scoped(self, scope: &RequestScope) -> Result<T, ApiError> {
        self.map_err(|e| ApiError::new(e.into(), scope))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        if status.is_server_error() {
            error!(resource = %self.resource, error = %self.error, "request failed");
        } else {
            warn!(resource = %self.resource, code = self.error.code(), "request rejected");
        }

        let dto = ErrorResponseDto::from_storage_error(&self.error, &self.resource, &self.request_id);
        let body = match to_xml(&dto) {
            Ok(body) => body,
            Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        };

        let mut response = (
            status,
            [(header::CONTENT_TYPE, "application/xml")],
            Body::from(body),
        )
            .into_response();

        // a delete marker reached by explicit id still identifies itself
        if let StorageError::MethodNotAllowed { version_id, .. } = &self.error {
            let headers = response.headers_mut();
            headers.insert(DELETE_MARKER_HEADER, HeaderValue::from_static("true"));
            if let Ok(value) = HeaderValue::from_str(&version_id.encode()) {
                headers.insert(VERSION_ID_HEADER, value);
            }
        }

        response
    }
}
