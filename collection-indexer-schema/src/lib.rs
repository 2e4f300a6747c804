//! # Collection Indexer Schema
//!
//! Turns declarative index definitions into [`IndexSchema`] values that
//! project, join, summarize and serialize stored documents into bulk NDJSON.
//!
//! ```
//! use collection_indexer_schema::IndexSchema;
//!
//! let schema = IndexSchema::from_json_str(
//!     r#"{"index": "books", "source": {"collection": "book", "fields": ["title"]}}"#,
//! )
//! .unwrap();
//! assert_eq!(schema.collection(), "book");
//! ```

pub mod definition;
pub mod errors;
pub mod schema;

pub use definition::{parse_definition, Conversion, IndexDefinition, JoinedCollection};
pub use errors::SchemaError;
pub use schema::{document_id, IndexSchema, JoinCondition, SummaryRule, ID_FIELD};
