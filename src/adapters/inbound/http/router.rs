use axum::{
    Router,
    http::{HeaderName, Method},
    routing::put,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{
    error::{DELETE_MARKER_HEADER, VERSION_ID_HEADER},
    handlers::{delete_object, get_bucket, get_object, head_object, put_bucket, put_object},
    middleware::{REQUEST_ID_HEADER, RequestScopeLayer},
};
use crate::ports::services::{BucketService, ObjectService};

/// Application state containing all services
#[derive(Clone)]
pub struct AppState {
    pub bucket_service: Arc<dyn BucketService>,
    pub object_service: Arc<dyn ObjectService>,
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers(Any)
        .expose_headers([
            HeaderName::from_static(VERSION_ID_HEADER),
            HeaderName::from_static(DELETE_MARKER_HEADER),
            HeaderName::from_static(REQUEST_ID_HEADER),
            axum::http::header::ETAG,
        ])
}

/// Create the S3-style router: `/{bucket}` and `/{bucket}/{key...}`
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/{bucket}", put(put_bucket).get(get_bucket))
        .route(
            "/{bucket}/{*key}",
            put(put_object)
                .get(get_object)
                .head(head_object)
                .delete(delete_object),
        )
        .layer(RequestScopeLayer)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        // Add state for dependency injection
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::outbound::{
            metrics::NoopMetricSink, persistence::InMemoryObjectRepository,
            storage::ApacheObjectStoreAdapter,
        },
        services::{BucketServiceImpl, ObjectServiceImpl},
    };
    use axum::http::HeaderValue;
    use axum_test::TestServer;

    fn create_test_app_state() -> AppState {
        let repository = Arc::new(InMemoryObjectRepository::new());
        let store = Arc::new(ApacheObjectStoreAdapter::in_memory());

        AppState {
            bucket_service: Arc::new(BucketServiceImpl::new(repository.clone())),
            object_service: Arc::new(ObjectServiceImpl::new(
                repository,
                store,
                Arc::new(NoopMetricSink),
            )),
        }
    }

    #[tokio::test]
    async fn test_router_assigns_request_id() {
        let server = TestServer::new(create_router(create_test_app_state())).unwrap();

        let response = server.get("/missing-bucket").add_query_param("versioning", "").await;

        response.assert_status_not_found();
        assert!(response.headers().get(REQUEST_ID_HEADER).is_some());
        assert!(response.text().contains("<Code>NoSuchBucket</Code>"));
    }

    #[tokio::test]
    async fn test_plain_bucket_listing_is_not_implemented() {
        let server = TestServer::new(create_router(create_test_app_state())).unwrap();

        server
            .put("/plain-bucket")
            .add_header(
                HeaderName::from_static("authorization"),
                HeaderValue::from_static("AWS AKIDOWNER:sig"),
            )
            .await
            .assert_status_ok();

        let response = server.get("/plain-bucket").await;
        assert_eq!(response.status_code(), axum::http::StatusCode::NOT_IMPLEMENTED);
    }
}
