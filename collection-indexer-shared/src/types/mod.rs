//! Core value types shared across the indexer crates.

pub mod field_path;
pub mod index_event;

pub use field_path::{minimize, FieldPath, SEGMENT_DELIMITER};
pub use index_event::{IndexAction, IndexEvent};
