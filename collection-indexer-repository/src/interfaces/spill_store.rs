//! Spill store trait definition.

use async_trait::async_trait;

use crate::errors::RepositoryError;

/// Durable holding area for bulk payloads that were sent but not acknowledged.
#[async_trait]
pub trait SpillStore: Send + Sync {
    /// Persist pending payloads.
    async fn store(&self, payloads: &[String]) -> Result<(), RepositoryError>;

    /// Read and remove every pending payload, oldest first.
    async fn drain(&self) -> Result<Vec<String>, RepositoryError>;
}
