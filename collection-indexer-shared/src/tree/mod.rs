//! Generic traversal over hierarchical documents.

pub mod bson_tree;
pub mod document_tree;
pub mod json_tree;
pub mod prune;
pub mod walker;

pub use document_tree::{is_positional_key, DocumentTree, Entries, NodeKind};
pub use prune::{prune, PruneDecision};
pub use walker::{walk, Step, WalkContext};
