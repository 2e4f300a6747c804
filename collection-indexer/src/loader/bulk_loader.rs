//! Bulk submission with retry and admission control.

use std::sync::Arc;
use std::time::Duration;

use collection_indexer_repository::{BulkAck, SearchSink, SinkError};
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::{info, instrument, warn};

use super::admission::AdmissionControl;

/// Configuration for the bulk loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Retries after the first failed request.
    pub retry_max_attempts: usize,
    /// Delay before the first retry; later delays double.
    pub retry_min_backoff: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            retry_max_attempts: 3,
            retry_min_backoff: Duration::from_secs(2),
        }
    }
}

/// Sends bulk payloads to the search engine.
///
/// Overload and server failures are retried with exponential backoff; client
/// errors fail at once. Every attempt passes through admission control.
pub struct BulkLoader {
    sink: Arc<dyn SearchSink>,
    admission: AdmissionControl,
    config: LoaderConfig,
}

impl BulkLoader {
    pub fn new(
        sink: Arc<dyn SearchSink>,
        admission: AdmissionControl,
        config: LoaderConfig,
    ) -> Self {
        Self {
            sink,
            admission,
            config,
        }
    }

    pub fn admission(&self) -> &AdmissionControl {
        &self.admission
    }

    /// Delays between attempts: `min`, `2 * min`, `4 * min`, ...
    fn backoff(&self) -> impl Iterator<Item = Duration> {
        let half_min_ms = (self.config.retry_min_backoff.as_millis() as u64 / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(half_min_ms)
            .take(self.config.retry_max_attempts)
    }

    /// Submit one payload.
    ///
    /// # Returns
    ///
    /// * `Ok(BulkAck)` - The search engine accepted the request
    /// * `Err(SinkError::RetriesExhausted)` - Retryable failures outlasted the retries
    /// * `Err(SinkError)` - A non-retryable failure
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub async fn submit(&self, payload: &str) -> Result<BulkAck, SinkError> {
        let sink = self.sink.as_ref();
        let admission = &self.admission;

        let attempt = move || async move {
            let _in_flight = admission.admit().await;
            info!("Request: POST /_bulk");
            let result = sink.bulk(payload).await;
            match &result {
                Ok(ack) => info!(status = ack.status, items = ack.items, "Response status"),
                Err(e) => warn!(error = %e, "Bulk request failed"),
            }
            result
        };

        RetryIf::spawn(self.backoff(), attempt, SinkError::is_retryable)
            .await
            .map_err(|e| {
                if e.is_retryable() {
                    SinkError::retries_exhausted(&e)
                } else {
                    e
                }
            })
    }
}
