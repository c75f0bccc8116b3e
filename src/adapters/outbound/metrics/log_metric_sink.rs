use tracing::info;

use crate::ports::metrics::{MetricEvent, MetricSink};

/// Writes metric events to the log
#[derive(Debug, Clone, Default)]
pub struct LogMetricSink;

impl MetricSink for LogMetricSink {
    fn emit(&self, event: MetricEvent) {
        info!(
            target: "metrics",
            action = event.kind.as_str(),
            bucket = %event.bucket,
            key = %event.key,
            byte_length = event.byte_length,
            old_byte_length = ?event.old_byte_length,
            number_of_objects = event.number_of_objects,
            "metric"
        );
    }
}

/// Discards metric events
#[derive(Debug, Clone, Default)]
pub struct NoopMetricSink;

impl MetricSink for NoopMetricSink {
    fn emit(&self, _event: MetricEvent) {}
}
