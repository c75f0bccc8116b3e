use std::sync::{Arc, Mutex};

use crate::ports::metrics::{MetricEvent, MetricSink};

/// Keeps every emitted event in memory; clones share the same record
#[derive(Debug, Clone, Default)]
pub struct RecordingMetricSink {
    events: Arc<Mutex<Vec<MetricEvent>>>,
}

impl RecordingMetricSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events emitted so far
    pub fn events(&self) -> Vec<MetricEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        match self.events.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl MetricSink for RecordingMetricSink {
    fn emit(&self, event: MetricEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
