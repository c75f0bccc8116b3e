use axum::{
    body::Body,
    http::{HeaderValue, Request, Response, header::AUTHORIZATION},
};
use futures::future::BoxFuture;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use uuid::Uuid;

use crate::domain::models::RequestContext;

pub const REQUEST_ID_HEADER: &str = "x-amz-request-id";

/// Per-request data made available to handlers as an extension
#[derive(Debug, Clone)]
pub struct RequestScope {
    pub context: RequestContext,
    pub request_id: String,
    /// Request path, reported as `Resource` in error documents
    pub resource: String,
}

/// Access key of the caller, taken from either signature scheme.
///
/// Signatures are not verified here; a missing header means the caller is
/// anonymous.
pub fn access_key_from_authorization(value: &str) -> Option<&str> {
    if let Some(rest) = value.strip_prefix("AWS4-HMAC-SHA256") {
        let credential = rest
            .split(',')
            .map(str::trim)
            .find_map(|part| part.strip_prefix("Credential="))?;
        return credential.split('/').next().filter(|key| !key.is_empty());
    }

    value
        .strip_prefix("AWS ")
        .and_then(|rest| rest.split(':').next())
        .map(str::trim)
        .filter(|key| !key.is_empty())
}

fn request_context(request: &Request<Body>) -> RequestContext {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(access_key_from_authorization)
        .map(RequestContext::account)
        .unwrap_or_else(RequestContext::anonymous)
}

/// Layer attaching a [`RequestScope`] to every request and echoing its
/// request id in the response
#[derive(Debug, Clone, Default)]
pub struct RequestScopeLayer;

impl<S> Layer<S> for RequestScopeLayer {
    type Service = RequestScopeMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestScopeMiddleware { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequestScopeMiddleware<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestScopeMiddleware<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let scope = RequestScope {
            context: request_context(&req),
            request_id: Uuid::new_v4().simple().to_string().to_uppercase(),
            resource: req.uri().path().to_string(),
        };
        let request_id = HeaderValue::from_str(&scope.request_id).ok();
        req.extensions_mut().insert(scope);

        let future = self.inner.call(req);
        Box::pin(async move {
            let mut response = future.await?;
            if let Some(request_id) = request_id {
                response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_key_from_sigv4() {
        let header = "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240101/us-east-1/s3/aws4_request, SignedHeaders=host;x-amz-date, Signature=abc";
        assert_eq!(access_key_from_authorization(header), Some("AKIDEXAMPLE"));
    }

    #[test]
    fn test_access_key_from_sigv2() {
        assert_eq!(
            access_key_from_authorization("AWS AKIDEXAMPLE:c2lnbmF0dXJl"),
            Some("AKIDEXAMPLE")
        );
    }

    #[test]
    fn test_unrecognized_authorization() {
        assert_eq!(access_key_from_authorization("Bearer token"), None);
        assert_eq!(access_key_from_authorization("AWS :sig"), None);
        assert_eq!(
            access_key_from_authorization("AWS4-HMAC-SHA256 SignedHeaders=host"),
            None
        );
    }
}
