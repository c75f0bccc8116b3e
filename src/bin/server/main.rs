use anyhow::{Context, Result};
use clap::Parser;
use std::{net::SocketAddr, path::PathBuf};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use versioned_object_store::{
    adapters::inbound::http::router::create_router,
    app::{AppBuilder, AppConfig, MetricsBackend, StorageBackend},
    adapters::outbound::storage::S3StoreSettings,
};

#[derive(Parser, Debug)]
#[command(name = "versioned-store-server")]
#[command(about = "S3-compatible object server with bucket versioning", long_about = None)]
struct Cli {
    /// Server port to listen on
    #[arg(short, long, env = "SERVER_PORT", default_value = "3000")]
    port: u16,

    /// Server host to bind to
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Payload storage backend: memory, local or s3
    #[arg(long, env = "STORAGE_BACKEND", default_value = "memory")]
    storage_backend: String,

    /// Root directory for the local backend
    #[arg(long, env = "DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// S3 endpoint URL (for S3-compatible services)
    #[arg(long, env = "S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    /// S3 bucket holding payloads
    #[arg(long, env = "S3_BUCKET")]
    s3_bucket: Option<String>,

    /// S3 region
    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    s3_region: String,

    /// S3 access key
    #[arg(long, env = "S3_ACCESS_KEY")]
    s3_access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "S3_SECRET_KEY")]
    s3_secret_key: Option<String>,

    /// Allow plain HTTP to the S3 endpoint
    #[arg(long, env = "S3_ALLOW_HTTP", default_value = "false")]
    s3_allow_http: bool,

    /// Metrics backend: disabled, log or http
    #[arg(long, env = "METRICS_BACKEND", default_value = "log")]
    metrics_backend: String,

    /// Collector URL for the http metrics backend
    #[arg(long, env = "METRICS_ENDPOINT")]
    metrics_endpoint: Option<String>,

    /// Node id embedded in version ids; must differ between nodes sharing metadata
    #[arg(long, env = "VERSION_NODE_ID", default_value = "0")]
    node_id: u16,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn to_app_config(&self) -> Result<AppConfig> {
        let storage_backend = match self.storage_backend.as_str() {
            "memory" => StorageBackend::InMemory,
            "local" => StorageBackend::LocalFileSystem {
                root: self
                    .data_dir
                    .clone()
                    .context("DATA_DIR is required for local backend")?,
            },
            "s3" => StorageBackend::S3(S3StoreSettings {
                bucket: self
                    .s3_bucket
                    .clone()
                    .context("S3_BUCKET is required for S3 backend")?,
                region: self.s3_region.clone(),
                endpoint: self.s3_endpoint.clone(),
                access_key: self.s3_access_key.clone(),
                secret_key: self.s3_secret_key.clone(),
                allow_http: self.s3_allow_http,
            }),
            _ => anyhow::bail!("Unknown storage backend: {}", self.storage_backend),
        };

        let metrics_backend = match self.metrics_backend.as_str() {
            "disabled" => MetricsBackend::Disabled,
            "log" => MetricsBackend::Log,
            "http" => MetricsBackend::Http {
                endpoint: self
                    .metrics_endpoint
                    .clone()
                    .context("METRICS_ENDPOINT is required for http metrics")?,
            },
            _ => anyhow::bail!("Unknown metrics backend: {}", self.metrics_backend),
        };

        Ok(AppConfig {
            storage_backend,
            metrics_backend,
            node_id: self.node_id,
        })
    }

    fn init_logging(&self) -> Result<()> {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&self.log_level).context("Invalid log level")?,
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("Failed to initialize logging")?;

        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    info!("Starting versioned object store server");
    info!("Storage backend: {}", cli.storage_backend);
    info!("Metrics backend: {}", cli.metrics_backend);

    let config = cli.to_app_config()?;
    let app_services = AppBuilder::new()
        .with_config(config)
        .build()
        .await
        .context("Failed to build application")?;

    let router = create_router(app_services.into_state());

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("Failed to start server")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "versioned-store-server",
            "--port",
            "8080",
            "--storage-backend",
            "s3",
            "--s3-bucket",
            "payloads",
            "--s3-access-key",
            "test-key",
            "--s3-secret-key",
            "test-secret",
        ]);

        assert_eq!(cli.port, 8080);
        assert_eq!(cli.storage_backend, "s3");
        assert_eq!(cli.s3_bucket, Some("payloads".to_string()));
    }

    #[test]
    fn test_local_backend_requires_data_dir() {
        let cli = Cli::parse_from(["versioned-store-server", "--storage-backend", "local"]);
        // DATA_DIR may be set in the environment running the tests
        if cli.data_dir.is_none() {
            assert!(cli.to_app_config().is_err());
        }
    }

    #[test]
    fn test_http_metrics_config() {
        let cli = Cli::parse_from([
            "versioned-store-server",
            "--metrics-backend",
            "http",
            "--metrics-endpoint",
            "http://collector:9000/events",
            "--node-id",
            "4",
        ]);

        let config = cli.to_app_config().unwrap();
        assert!(matches!(config.metrics_backend, MetricsBackend::Http { .. }));
        assert_eq!(config.node_id, 4);
    }
}
