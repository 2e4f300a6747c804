//! Index definitions and their parser.

pub mod index_definition;
pub mod parser;

pub use index_definition::{
    Conversion, IndexDefinition, JoinSummary, JoinedCollection, DEFAULT_SUMMARY_FIELD_NAME,
    DEFAULT_SUMMARY_SEPARATOR,
};
pub use parser::parse_definition;
