//! Error types for the collection indexer pipeline.

use std::error::Error as StdError;

use collection_indexer_repository::{RepositoryError, SinkError};
use collection_indexer_schema::SchemaError;
use collection_indexer_shared::DocumentError;
use thiserror::Error;

/// Errors that can occur while a task moves documents through the pipeline.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Error from the loader component.
    #[error("Loader error: {0}")]
    LoaderError(String),

    /// Definition lookup, compilation or document transformation failed.
    #[error("Schema error: {0}")]
    SchemaError(#[from] SchemaError),

    /// A collaborator backend failed.
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),

    /// The search engine rejected a bulk payload or stayed unavailable.
    #[error("Sink error: {0}")]
    SinkError(#[from] SinkError),

    /// Error parsing or decoding data.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl IngestError {
    /// Create a loader error.
    pub fn loader(msg: impl Into<String>) -> Self {
        Self::LoaderError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}

impl From<DocumentError> for IngestError {
    fn from(err: DocumentError) -> Self {
        Self::SchemaError(SchemaError::Document(err))
    }
}

/// Render an error followed by every error in its `source()` chain.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !rendered.ends_with(&message) {
            rendered.push_str(": ");
            rendered.push_str(&message);
        }
        source = cause.source();
    }
    rendered
}
