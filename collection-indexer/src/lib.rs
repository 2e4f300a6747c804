//! # Collection Indexer
//!
//! Keeps search indexes in step with MongoDB collections. Index events from
//! Kafka and on-demand refresh requests are resolved to stored documents,
//! shaped by their index definition and bulk-loaded into OpenSearch.
//!
//! ## Architecture
//!
//! The indexer follows the Consumer-Processor-Loader pattern:
//!
//! 1. **Consumer**: Receives index events from Kafka
//! 2. **Processor**: Resolves, joins and transforms documents into bulk entries
//! 3. **Loader**: Batches entries and submits them to OpenSearch
//! 4. **Orchestrator**: Runs the incremental and refresh tasks
//!
//! ## Modules
//!
//! - [`config`]: Configuration and dependency initialization
//! - [`consumer`]: Event decoding and publishing
//! - [`registry`]: Compiled schema cache
//! - [`processor`]: Resolve, join and transform stages
//! - [`loader`]: Batching, admission control, retries and spilling
//! - [`orchestrator`]: Task lifecycle and progress reporting
//! - [`api`]: HTTP API
//! - [`errors`]: Error types for the indexer

pub mod api;
pub mod config;
pub mod consumer;
pub mod errors;
pub mod loader;
pub mod orchestrator;
pub mod processor;
pub mod registry;

pub use config::{Dependencies, PipelineConfig, ServiceConfig};
pub use errors::IngestError;
pub use orchestrator::{Collaborators, Orchestrator};

use thiserror::Error;

/// Errors that can occur during indexer initialization or execution.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),

    /// The HTTP API failed.
    #[error("Server error: {0}")]
    ServerError(String),
}

impl IndexingError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a server error.
    pub fn server(msg: impl Into<String>) -> Self {
        Self::ServerError(msg.into())
    }
}
