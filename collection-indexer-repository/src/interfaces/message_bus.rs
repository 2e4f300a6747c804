//! Message bus trait definition.

use async_trait::async_trait;
use collection_indexer_shared::IndexEvent;
use tokio::sync::mpsc;

use crate::errors::RepositoryError;

/// Event transport between the API layer and the incremental task.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish an index event.
    async fn publish(&self, event: &IndexEvent) -> Result<(), RepositoryError>;

    /// Forward raw message payloads into `sender` until the receiver is dropped.
    ///
    /// Each message is acknowledged once it has been handed to the channel.
    /// Returns `Ok(())` when the receiving side goes away.
    async fn consume(&self, sender: mpsc::Sender<Vec<u8>>) -> Result<(), RepositoryError>;
}
