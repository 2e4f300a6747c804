//! MongoDB document store.

mod data_store;

pub use data_store::MongoDataStore;
