//! Items entering the indexing pipeline.

use std::sync::Arc;

use bson::Document;
use collection_indexer_schema::IndexSchema;
use collection_indexer_shared::IndexEvent;

use crate::errors::IngestError;

/// One unit of work read from a task's source.
#[derive(Debug, Clone)]
pub enum SourceItem {
    /// An event from the bus; the document still has to be fetched.
    Event(IndexEvent),
    /// A document already read by a collection scan of the schema's collection.
    Scanned {
        schema: Arc<IndexSchema>,
        document: Document,
    },
}

/// Decode a bus payload into an [`IndexEvent`].
pub fn decode_event(payload: &[u8]) -> Result<IndexEvent, IngestError> {
    serde_json::from_slice(payload).map_err(|e| {
        IngestError::parse(format!(
            "{} For message: {}",
            e,
            String::from_utf8_lossy(payload)
        ))
    })
}
