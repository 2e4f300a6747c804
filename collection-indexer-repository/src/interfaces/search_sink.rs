//! Search sink trait definition.

use async_trait::async_trait;

use crate::errors::SinkError;
use crate::types::BulkAck;

/// Bulk endpoint of the search engine.
#[async_trait]
pub trait SearchSink: Send + Sync {
    /// Submit a newline-delimited bulk payload.
    ///
    /// # Arguments
    ///
    /// * `payload` - Bulk action and body lines, each terminated by `\n`
    ///
    /// # Returns
    ///
    /// * `Ok(BulkAck)` - The engine accepted the request
    /// * `Err(SinkError)` - The request failed; see [`SinkError::is_retryable`]
    async fn bulk(&self, payload: &str) -> Result<BulkAck, SinkError>;
}
