//! Bulk sink error types.

use thiserror::Error;

/// Errors from submitting a bulk payload to the search engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The search engine asked us to slow down (429).
    #[error("Search engine overloaded: status {status}")]
    Overloaded { status: u16 },

    /// The search engine failed to handle the request (5xx).
    #[error("Search engine unavailable: status {status}")]
    ServerUnavailable { status: u16 },

    /// The request was rejected (4xx other than 429).
    #[error("Search engine rejected the request: status {status}: {body}")]
    Client { status: u16, body: String },

    /// The request did not complete: connection failure or timeout.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Retryable failures persisted past the configured attempts.
    #[error("External service failed to process after max retries: {0}")]
    RetriesExhausted(String),

    /// The response body could not be read.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl SinkError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        match status {
            429 => Self::Overloaded { status },
            500..=599 => Self::ServerUnavailable { status },
            _ => Self::Client {
                status,
                body: body.into(),
            },
        }
    }

    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a retries exhausted error from the last failure.
    pub fn retries_exhausted(last: &SinkError) -> Self {
        Self::RetriesExhausted(last.to_string())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// True for failures that may succeed when the request is sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Overloaded { .. } | Self::ServerUnavailable { .. } | Self::Transport(_)
        )
    }
}
