//! Types exchanged with the repository backends.

use bson::Document;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::errors::RepositoryError;

/// Stream of documents produced by a collection scan.
pub type DocumentStream = BoxStream<'static, Result<Document, RepositoryError>>;

/// Acknowledgment of one bulk submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkAck {
    /// HTTP status of the response.
    pub status: u16,
    /// Number of entries in the response's `items` array.
    pub items: usize,
    /// The engine's `errors` flag: at least one item failed.
    pub errors: bool,
}
