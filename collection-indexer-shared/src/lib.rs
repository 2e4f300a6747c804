//! # Collection Indexer Shared
//!
//! Building blocks shared by the indexer crates: dotted field paths, a uniform
//! view over BSON and JSON documents, the depth-first walker and the prune
//! traversal built on it, and the index events exchanged over the message bus.

pub mod errors;
pub mod tree;
pub mod types;

pub use errors::DocumentError;
pub use tree::{prune, walk, DocumentTree, NodeKind, PruneDecision, Step, WalkContext};
pub use types::index_event::parse_object_id;
pub use types::{minimize, FieldPath, IndexAction, IndexEvent, SEGMENT_DELIMITER};
