//! Error types for the collection indexer repository.
//!
//! `RepositoryError` covers the document store, message bus and local file
//! backends. `SinkError` covers bulk submissions and knows which failures
//! are worth retrying.

mod repository_error;
mod sink_error;

pub use repository_error::RepositoryError;
pub use sink_error::SinkError;
