//! OpenSearch bulk sink.

mod sink;

pub use sink::OpenSearchSink;
