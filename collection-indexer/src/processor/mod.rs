//! Processor module for the collection indexer.
//!
//! Resolves source items to stored documents, joins related collections and
//! renders bulk entries.

mod document_processor;

pub use document_processor::{DocumentProcessor, ResolvedDocument};
