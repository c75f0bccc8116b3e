pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - core business entities and value objects
pub use domain::{
    // Models
    BucketMetadata,
    BucketVersioning,
    // Value objects
    BucketName,
    CannedAcl,
    DomainValidationError,
    ObjectKey,
    ObjectVersion,
    RequestContext,
    // Errors
    StorageError,
    StorageResult,
    VersionId,
    VersionKey,
};

// Port types - interfaces for external systems
pub use ports::{
    BucketService, MetricEvent, MetricKind, MetricSink, ObjectDataStore, ObjectRepository,
    ObjectService,
};

// Service implementations - business logic
pub use services::{BucketServiceImpl, ObjectServiceBuilder, ObjectServiceImpl};

// Application factory and configuration
pub use app::{
    AppBuilder, AppConfig, AppDependencies, AppError, AppServices, MetricsBackend,
    StorageBackend, config_from_env, create_app_from_env, create_in_memory_app,
};

// Adapter types - infrastructure implementations
pub use adapters::inbound::http::router::{AppState, create_router};
pub use adapters::outbound::{
    metrics::{HttpMetricSink, LogMetricSink, NoopMetricSink, RecordingMetricSink},
    persistence::InMemoryObjectRepository,
    storage::{ApacheObjectStoreAdapter, S3StoreSettings},
};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        ApacheObjectStoreAdapter, AppBuilder, AppServices, BucketName, BucketService,
        BucketServiceImpl, InMemoryObjectRepository, MetricSink, ObjectDataStore, ObjectKey,
        ObjectRepository, ObjectService, ObjectServiceImpl, RecordingMetricSink, RequestContext,
        VersionId, create_in_memory_app, create_router,
    };
}
