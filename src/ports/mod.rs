pub mod metrics;
pub mod repositories;
pub mod services;
pub mod storage;

// Re-export all port traits for convenience
pub use metrics::{MetricEvent, MetricKind, MetricSink};
pub use repositories::ObjectRepository;
pub use services::{BucketService, ObjectService};
pub use storage::ObjectDataStore;
