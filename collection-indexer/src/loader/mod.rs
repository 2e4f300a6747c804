//! Loader module for the collection indexer.
//!
//! Batches bulk entries and submits them to the search engine on one
//! serialized lane per task, spilling whatever is still unacknowledged when
//! the task ends.

mod admission;
mod batcher;
mod bulk_loader;

pub use admission::{AdmissionControl, InFlightGuard};
pub use batcher::Batcher;
pub use bulk_loader::{BulkLoader, LoaderConfig};

use std::sync::Arc;

use collection_indexer_repository::SpillStore;
use tracing::{error, info, instrument, warn};

use crate::errors::{error_chain, IngestError};
use crate::orchestrator::IndexTask;

/// Drives the batch, sink and bookkeeping stages of a task.
pub struct SearchLoader {
    bulk: Arc<BulkLoader>,
    spill: Arc<dyn SpillStore>,
}

impl SearchLoader {
    pub fn new(bulk: Arc<BulkLoader>, spill: Arc<dyn SpillStore>) -> Self {
        Self { bulk, spill }
    }

    pub fn admission(&self) -> &AdmissionControl {
        self.bulk.admission()
    }

    /// Recover payloads spilled by an earlier run.
    pub async fn recover(&self) -> Vec<String> {
        match self.spill.drain().await {
            Ok(payloads) => {
                if !payloads.is_empty() {
                    info!(count = payloads.len(), "Recovered spilled bulk payloads");
                }
                payloads
            }
            Err(e) => {
                error!(error = %error_chain(&e), "Failed to read spilled bulk payloads");
                Vec::new()
            }
        }
    }

    /// Run the lane until the batch source is exhausted, the task is
    /// cancelled, or a bulk request fails for good.
    ///
    /// `recovered` payloads are submitted before any fresh batch. Requests are
    /// issued one at a time, so acknowledgments arrive in batch order. A
    /// request in flight at cancellation is left to finish on its own; its
    /// payload is spilled along with any recovered payload not yet sent.
    #[instrument(skip_all, fields(task_id = %task.id()))]
    pub async fn run(
        &self,
        task: Arc<IndexTask>,
        mut batcher: Batcher,
        recovered: Vec<String>,
    ) -> Result<(), IngestError> {
        let cancellation = task.cancellation().clone();
        let mut recovered = recovered.into_iter();
        let mut unacknowledged: Option<String> = None;

        let outcome = loop {
            if cancellation.is_cancelled() {
                break Ok(());
            }
            let payload = match recovered.next() {
                Some(payload) => payload,
                None => {
                    let batch = tokio::select! {
                        biased;
                        _ = cancellation.cancelled() => break Ok(()),
                        batch = batcher.next_batch() => batch,
                    };
                    let Some(batch) = batch else {
                        break Ok(());
                    };
                    task.add_documents_read(batch.len() as u64);
                    batch.concat()
                }
            };

            unacknowledged = Some(payload.clone());
            let bulk = Arc::clone(&self.bulk);
            let request = tokio::spawn(async move { bulk.submit(&payload).await });

            let response = tokio::select! {
                biased;
                _ = cancellation.cancelled() => break Ok(()),
                response = request => response,
            };

            match response {
                Ok(Ok(ack)) => {
                    unacknowledged = None;
                    task.add_documents_written(ack.items as u64);
                    if ack.errors {
                        warn!(items = ack.items, "Bulk response reports item errors");
                    }
                    let admission = self.bulk.admission();
                    if admission.is_overloaded() {
                        warn!(
                            in_flight = admission.in_flight(),
                            threshold = admission.threshold(),
                            "Too many bulk requests in flight, cancelling task"
                        );
                        task.cancel();
                    }
                }
                Ok(Err(e)) => break Err(IngestError::from(e)),
                Err(e) => {
                    break Err(IngestError::loader(format!("Bulk request task failed: {}", e)))
                }
            }
        };

        let pending: Vec<String> = unacknowledged.into_iter().chain(recovered).collect();
        if !pending.is_empty() {
            self.spill_payloads(&pending).await;
        }
        outcome
    }

    async fn spill_payloads(&self, payloads: &[String]) {
        match self.spill.store(payloads).await {
            Ok(()) => info!(count = payloads.len(), "Spilled unacknowledged bulk payloads"),
            Err(e) => error!(error = %error_chain(&e), "Failed to spill bulk payloads"),
        }
    }
}
