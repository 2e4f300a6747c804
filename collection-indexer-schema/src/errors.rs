//! Schema error types.

use collection_indexer_shared::DocumentError;
use thiserror::Error;

/// Errors from parsing definitions and compiling or applying a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The definition or a stored document has an unexpected shape.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// No definition exists for the requested index and type.
    #[error("Not found index definition: {index} {index_type}")]
    DefinitionNotFound { index: String, index_type: String },

    /// The definition parsed but is missing required settings.
    #[error("Invalid index definition: {0}")]
    InvalidDefinition(String),

    /// The definition text is not valid JSON.
    #[error("Definition JSON error: {0}")]
    Json(String),
}

impl SchemaError {
    /// Create a definition not found error. A missing type renders as empty.
    pub fn definition_not_found(index: impl Into<String>, index_type: Option<&str>) -> Self {
        Self::DefinitionNotFound {
            index: index.into(),
            index_type: index_type.unwrap_or_default().to_string(),
        }
    }

    /// Create an invalid definition error.
    pub fn invalid_definition(msg: impl Into<String>) -> Self {
        Self::InvalidDefinition(msg.into())
    }

    /// Create a JSON error.
    pub fn json(msg: impl Into<String>) -> Self {
        Self::Json(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_not_found_message() {
        let err = SchemaError::definition_not_found("books", Some("novel"));
        assert_eq!(err.to_string(), "Not found index definition: books novel");

        let err = SchemaError::definition_not_found("books", None);
        assert_eq!(err.to_string(), "Not found index definition: books ");
    }
}
