//! Compiled index schema: bulk line building, summaries and join filters.

pub mod bulk;
pub mod index_schema;
pub mod join;
mod summary;

pub use bulk::{document_id, ID_FIELD};
pub use index_schema::{IndexSchema, SummaryRule};
pub use join::JoinCondition;
