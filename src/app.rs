use std::{path::PathBuf, sync::Arc};

use crate::{
    adapters::{
        inbound::http::router::AppState,
        outbound::{
            metrics::{HttpMetricSink, LogMetricSink, NoopMetricSink},
            persistence::InMemoryObjectRepository,
            storage::{ApacheObjectStoreAdapter, S3StoreSettings},
        },
    },
    domain::value_objects::VersionKeyGenerator,
    ports::{metrics::MetricSink, repositories::ObjectRepository, storage::ObjectDataStore},
    services::{BucketServiceImpl, ObjectServiceImpl},
};

/// Configuration for the application
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub metrics_backend: MetricsBackend,
    /// Node id embedded in minted version ids
    pub node_id: u16,
}

/// Payload storage backend configuration
#[derive(Debug, Clone, Default)]
pub enum StorageBackend {
    #[default]
    InMemory,
    LocalFileSystem {
        root: PathBuf,
    },
    S3(S3StoreSettings),
}

/// Where metering events go
#[derive(Debug, Clone, Default)]
pub enum MetricsBackend {
    Disabled,
    #[default]
    Log,
    Http {
        endpoint: String,
    },
}

/// Application dependencies container
pub struct AppDependencies {
    pub data_store: Arc<dyn ObjectDataStore>,
    pub object_repository: Arc<dyn ObjectRepository>,
    pub metric_sink: Arc<dyn MetricSink>,
}

/// Application services container
pub struct AppServices {
    pub bucket_service: BucketServiceImpl,
    pub object_service: ObjectServiceImpl,
}

impl AppServices {
    /// Router state sharing these services
    pub fn into_state(self) -> AppState {
        AppState {
            bucket_service: Arc::new(self.bucket_service),
            object_service: Arc::new(self.object_service),
        }
    }
}

/// Application builder for dependency injection
#[derive(Default)]
pub struct AppBuilder {
    config: AppConfig,
    metric_sink: Option<Arc<dyn MetricSink>>,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.config.storage_backend = backend;
        self
    }

    /// Configure metrics backend
    pub fn with_metrics_backend(mut self, backend: MetricsBackend) -> Self {
        self.config.metrics_backend = backend;
        self
    }

    pub fn with_node_id(mut self, node_id: u16) -> Self {
        self.config.node_id = node_id;
        self
    }

    /// Use this sink instead of the configured metrics backend
    pub fn with_metric_sink(mut self, sink: Arc<dyn MetricSink>) -> Self {
        self.metric_sink = Some(sink);
        self
    }

    /// Build the application dependencies
    pub async fn build_dependencies(self) -> Result<AppDependencies, AppError> {
        let data_store = self.create_data_store()?;
        let metric_sink = match self.metric_sink.clone() {
            Some(sink) => sink,
            None => self.create_metric_sink()?,
        };
        let object_repository = Arc::new(InMemoryObjectRepository::with_generator(
            VersionKeyGenerator::new(self.config.node_id),
        ));

        Ok(AppDependencies {
            data_store,
            object_repository,
            metric_sink,
        })
    }

    /// Build the complete application with services
    pub async fn build(self) -> Result<AppServices, AppError> {
        let deps = self.build_dependencies().await?;

        let bucket_service = BucketServiceImpl::new(deps.object_repository.clone());
        let object_service = ObjectServiceImpl::new(
            deps.object_repository,
            deps.data_store,
            deps.metric_sink,
        );

        Ok(AppServices {
            bucket_service,
            object_service,
        })
    }

    fn create_data_store(&self) -> Result<Arc<dyn ObjectDataStore>, AppError> {
        let adapter = match &self.config.storage_backend {
            StorageBackend::InMemory => ApacheObjectStoreAdapter::in_memory(),
            StorageBackend::LocalFileSystem { root } => ApacheObjectStoreAdapter::local(root)
                .map_err(|e| AppError::StorageInit {
                    message: format!("{}: {}", root.display(), e),
                })?,
            StorageBackend::S3(settings) => {
                ApacheObjectStoreAdapter::s3(settings).map_err(|e| AppError::StorageInit {
                    message: e.to_string(),
                })?
            }
        };
        Ok(Arc::new(adapter))
    }

    /// Must run inside a tokio runtime for the HTTP backend
    fn create_metric_sink(&self) -> Result<Arc<dyn MetricSink>, AppError> {
        let sink: Arc<dyn MetricSink> = match &self.config.metrics_backend {
            MetricsBackend::Disabled => Arc::new(NoopMetricSink),
            MetricsBackend::Log => Arc::new(LogMetricSink),
            MetricsBackend::Http { endpoint } => {
                Arc::new(HttpMetricSink::spawn(endpoint.clone()).map_err(|e| {
                    AppError::MetricsInit {
                        message: e.to_string(),
                    }
                })?)
            }
        };
        Ok(sink)
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Storage initialization error: {message}")]
    StorageInit { message: String },

    #[error("Metrics initialization error: {message}")]
    MetricsInit { message: String },
}

/// Convenience functions for common configurations
///
/// Create an in-memory application for testing and development
pub async fn create_in_memory_app() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::InMemory)
        .with_metrics_backend(MetricsBackend::Disabled)
        .build()
        .await
}

fn required_env(name: &str) -> Result<String, AppError> {
    std::env::var(name).map_err(|_| AppError::Configuration {
        message: format!("{} environment variable required", name),
    })
}

/// Read the application configuration from environment variables
pub fn config_from_env() -> Result<AppConfig, AppError> {
    let storage_backend = match std::env::var("STORAGE_BACKEND").as_deref() {
        Ok("local") => StorageBackend::LocalFileSystem {
            root: PathBuf::from(required_env("DATA_DIR")?),
        },
        Ok("s3") => StorageBackend::S3(S3StoreSettings {
            bucket: required_env("S3_BUCKET")?,
            region: std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            endpoint: std::env::var("S3_ENDPOINT").ok(),
            access_key: std::env::var("S3_ACCESS_KEY").ok(),
            secret_key: std::env::var("S3_SECRET_KEY").ok(),
            allow_http: std::env::var("S3_ALLOW_HTTP")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }),
        Ok("memory") | Err(_) => StorageBackend::InMemory,
        Ok(other) => {
            return Err(AppError::Configuration {
                message: format!("Unknown storage backend: {}", other),
            });
        }
    };

    let metrics_backend = match std::env::var("METRICS_BACKEND").as_deref() {
        Ok("disabled") => MetricsBackend::Disabled,
        Ok("http") => MetricsBackend::Http {
            endpoint: required_env("METRICS_ENDPOINT")?,
        },
        Ok("log") | Err(_) => MetricsBackend::Log,
        Ok(other) => {
            return Err(AppError::Configuration {
                message: format!("Unknown metrics backend: {}", other),
            });
        }
    };

    let node_id = match std::env::var("VERSION_NODE_ID") {
        Ok(raw) => raw.parse().map_err(|_| AppError::Configuration {
            message: format!("VERSION_NODE_ID must be an integer in 0..=65535, got {}", raw),
        })?,
        Err(_) => 0,
    };

    Ok(AppConfig {
        storage_backend,
        metrics_backend,
        node_id,
    })
}

/// Create application from environment variables
pub async fn create_app_from_env() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_config(config_from_env()?)
        .build()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::outbound::metrics::RecordingMetricSink,
        domain::{
            models::{CannedAcl, PutObjectRequest, RequestContext},
            value_objects::{BucketName, ObjectKey},
        },
        ports::services::{BucketService, ObjectService},
    };

    #[tokio::test]
    async fn test_create_in_memory_app() {
        let app = create_in_memory_app().await.unwrap();
        let owner = RequestContext::account("AKIDOWNER");
        let bucket = BucketName::try_from("app-bucket").unwrap();

        app.bucket_service
            .create_bucket(&owner, bucket.clone(), CannedAcl::Private)
            .await
            .unwrap();
        let versioning = app
            .bucket_service
            .get_bucket_versioning(&owner, &bucket)
            .await
            .unwrap();
        assert!(!versioning.is_configured());
    }

    #[tokio::test]
    async fn test_app_builder_uses_injected_sink() {
        let sink = RecordingMetricSink::new();
        let app = AppBuilder::new()
            .with_node_id(9)
            .with_metric_sink(Arc::new(sink.clone()))
            .build()
            .await
            .unwrap();

        let owner = RequestContext::account("AKIDOWNER");
        let bucket = BucketName::try_from("metered-bucket").unwrap();
        app.bucket_service
            .create_bucket(&owner, bucket.clone(), CannedAcl::Private)
            .await
            .unwrap();
        app.object_service
            .put_object(
                &owner,
                PutObjectRequest::builder()
                    .bucket(bucket)
                    .key(ObjectKey::try_from("a.txt").unwrap())
                    .data(bytes::Bytes::from_static(b"abc"))
                    .build(),
            )
            .await
            .unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].byte_length, 3);
    }

    #[tokio::test]
    async fn test_local_backend_dependencies() {
        let root = std::env::temp_dir().join(format!("app-{}", uuid::Uuid::new_v4()));
        AppBuilder::new()
            .with_storage_backend(StorageBackend::LocalFileSystem { root: root.clone() })
            .with_metrics_backend(MetricsBackend::Disabled)
            .build_dependencies()
            .await
            .unwrap();

        assert!(root.is_dir());
        std::fs::remove_dir_all(root).unwrap();
    }
}
