mod http_metric_sink;
mod log_metric_sink;
mod recording_metric_sink;

pub use http_metric_sink::HttpMetricSink;
pub use log_metric_sink::{LogMetricSink, NoopMetricSink};
pub use recording_metric_sink::RecordingMetricSink;
