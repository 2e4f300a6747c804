//! # Collection Indexer Repository
//!
//! Traits for the collaborators of the indexing pipeline and their concrete
//! backends: MongoDB as the document store, OpenSearch as the bulk sink,
//! Kafka as the event bus, and local files for index definitions and spilled
//! payloads.

pub mod config;
pub mod errors;
pub mod file;
pub mod interfaces;
pub mod kafka;
pub mod mongo;
pub mod opensearch;
pub mod types;

pub use config::{BusConfig, DefinitionConfig, SinkConfig, StoreConfig};
pub use errors::{RepositoryError, SinkError};
pub use file::{FileDefinitionRepository, FileSpillStore};
pub use interfaces::{DataStore, IndexDefinitionRepository, MessageBus, SearchSink, SpillStore};
pub use kafka::KafkaMessageBus;
pub use mongo::MongoDataStore;
pub use opensearch::OpenSearchSink;
pub use types::{BulkAck, DocumentStream};
