//! Interface definitions for the collaborators of the indexing pipeline.
//!
//! Each trait is implemented by one concrete backend in this crate and by
//! hand-written mocks in tests.

mod data_store;
mod definition_repository;
mod message_bus;
mod search_sink;
mod spill_store;

pub use data_store::DataStore;
pub use definition_repository::IndexDefinitionRepository;
pub use message_bus::MessageBus;
pub use search_sink::SearchSink;
pub use spill_store::SpillStore;
