//! Repository error types.

use thiserror::Error;

/// Errors from the document store, the message bus and the file backends.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// Failed to establish a connection to a backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A store query or cursor failed.
    #[error("Query error: {0}")]
    QueryError(String),

    /// Local file access failed.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A file could not be decoded with the configured charset.
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// Failed to serialize or deserialize a payload.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Message bus publish or consume failure.
    #[error("Bus error: {0}")]
    BusError(String),
}

impl RepositoryError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    /// Create an I/O error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::IoError(msg.into())
    }

    /// Create an encoding error.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::EncodingError(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Create a bus error.
    pub fn bus(msg: impl Into<String>) -> Self {
        Self::BusError(msg.into())
    }
}
