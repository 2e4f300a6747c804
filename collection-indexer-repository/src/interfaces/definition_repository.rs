//! Index definition repository trait definition.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::RepositoryError;

/// Source of raw index definition documents.
#[async_trait]
pub trait IndexDefinitionRepository: Send + Sync {
    /// Load the definition for `name` and optional `index_type`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Value))` - The raw definition document
    /// * `Ok(None)` - No definition exists for this name and type
    /// * `Err(RepositoryError)` - The definition exists but cannot be read or decoded
    async fn load(
        &self,
        name: &str,
        index_type: Option<&str>,
    ) -> Result<Option<Value>, RepositoryError>;
}
