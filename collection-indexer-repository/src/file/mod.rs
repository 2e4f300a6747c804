//! Local file backends: index definitions and the spill directory.

mod definition_repository;
mod spill_store;

pub use definition_repository::FileDefinitionRepository;
pub use spill_store::FileSpillStore;
