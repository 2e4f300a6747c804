//! Errors raised while reading documents.
//!
//! Both the definition parser and the transformation engine surface these
//! when a document does not have the shape they expect.

use thiserror::Error;

use crate::tree::{DocumentTree, WalkContext};

/// Separator used when rendering the raw key path of an offending node.
pub const RAW_PATH_DELIMITER: char = '\\';

/// Document shape and identifier errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// A leaf was found where a structure was expected, or the reverse.
    #[error("{message} \"{key}\" path {path}: {value}")]
    DataConversion {
        message: String,
        key: String,
        path: String,
        value: String,
    },

    /// A document identifier is not a 24-character hex object id.
    #[error("Illegal identifier: {0}")]
    IllegalIdentifier(String),
}

impl DocumentError {
    /// Create a data conversion error for `key` at the walker's current position.
    pub fn data_conversion<T: DocumentTree>(
        message: impl Into<String>,
        ctx: &WalkContext,
        key: &str,
        value: &T,
    ) -> Self {
        Self::DataConversion {
            message: message.into(),
            key: key.to_string(),
            path: ctx.raw_path(key),
            value: value.raw_display(),
        }
    }

    /// Create an illegal identifier error.
    pub fn illegal_identifier(msg: impl Into<String>) -> Self {
        Self::IllegalIdentifier(msg.into())
    }
}
