use reqwest::Client;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::ports::metrics::{MetricEvent, MetricSink};

const DEFAULT_CHANNEL_CAPACITY: usize = 10_000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Ships metric events to an HTTP collector as JSON.
///
/// `emit` only enqueues; a background task does the POSTs. Events are dropped
/// (and counted) when the queue is full or the collector fails.
#[derive(Clone)]
pub struct HttpMetricSink {
    sender: mpsc::Sender<MetricEvent>,
    dropped: Arc<AtomicU64>,
}

impl HttpMetricSink {
    /// Start the delivery task. Must be called from within a tokio runtime.
    pub fn spawn(endpoint: impl Into<String>) -> Result<Self, reqwest::Error> {
        Self::spawn_with_capacity(endpoint, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn spawn_with_capacity(
        endpoint: impl Into<String>,
        capacity: usize,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let (sender, receiver) = mpsc::channel(capacity);
        let dropped = Arc::new(AtomicU64::new(0));

        tokio::spawn(deliver(client, endpoint.into(), receiver, dropped.clone()));

        Ok(Self { sender, dropped })
    }

    /// Number of events that never reached the collector
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl MetricSink for HttpMetricSink {
    fn emit(&self, event: MetricEvent) {
        if let Err(err) = self.sender.try_send(event) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(error = %err, "metric queue unavailable, dropping event");
        }
    }
}

async fn deliver(
    client: Client,
    endpoint: String,
    mut receiver: mpsc::Receiver<MetricEvent>,
    dropped: Arc<AtomicU64>,
) {
    while let Some(event) = receiver.recv().await {
        let result = client
            .post(&endpoint)
            .json(&event)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => debug!(action = event.kind.as_str(), "metric delivered"),
            Err(err) => {
                dropped.fetch_add(1, Ordering::Relaxed);
                warn!(endpoint = %endpoint, error = %err, "failed to deliver metric");
            }
        }
    }
}
