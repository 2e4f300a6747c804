//! Index events carried by the message bus.

use bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

use crate::errors::DocumentError;

/// Bulk action requested for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexAction {
    Index,
    Delete,
}

/// A request to (re)index or delete one document.
///
/// Wire form: `{"action":"index","id":"...","indexName":"...","indexType":"..."}`
/// with `indexType` optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEvent {
    pub action: IndexAction,
    pub id: String,
    pub index_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_type: Option<String>,
}

impl IndexEvent {
    pub fn new(
        action: IndexAction,
        id: impl Into<String>,
        index_name: impl Into<String>,
        index_type: Option<String>,
    ) -> Self {
        Self {
            action,
            id: id.into(),
            index_name: index_name.into(),
            index_type: index_type.filter(|t| !t.is_empty()),
        }
    }

    /// The document identifier as an object id.
    pub fn object_id(&self) -> Result<ObjectId, DocumentError> {
        parse_object_id(&self.id)
    }

    /// Identifier-only filter, `{_id: ObjectId(id)}`.
    pub fn id_filter(&self) -> Result<Document, DocumentError> {
        Ok(doc! { "_id": self.object_id()? })
    }
}

/// Parse a 24-character hex object id.
pub fn parse_object_id(raw: &str) -> Result<ObjectId, DocumentError> {
    ObjectId::parse_str(raw)
        .map_err(|e| DocumentError::illegal_identifier(format!("{:?}: {}", raw, e)))
}
