//! Document store trait definition.

use async_trait::async_trait;
use bson::Document;

use crate::errors::RepositoryError;
use crate::types::DocumentStream;

/// Read access to named collections of the primary document store.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Find every document of `collection` matching `filter`.
    ///
    /// # Arguments
    ///
    /// * `collection` - Collection name
    /// * `filter` - Query document; keys may be dotted paths
    /// * `projection` - Fields to return, or `None` for whole documents
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Document>)` - Matching documents, possibly none
    /// * `Err(RepositoryError)` - If the query fails
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        projection: Option<Document>,
    ) -> Result<Vec<Document>, RepositoryError>;

    /// Stream every document of `collection`.
    ///
    /// # Arguments
    ///
    /// * `collection` - Collection name
    /// * `projection` - Fields to return, or `None` for whole documents
    ///
    /// # Returns
    ///
    /// * `Ok(DocumentStream)` - A stream that yields documents as the cursor advances
    /// * `Err(RepositoryError)` - If the scan cannot be started
    async fn scan(
        &self,
        collection: &str,
        projection: Option<Document>,
    ) -> Result<DocumentStream, RepositoryError>;
}
