//! Configuration types for the repository backends.

use std::path::PathBuf;
use std::time::Duration;

/// Default OpenSearch URL.
pub const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default per-request timeout for bulk submissions, in milliseconds.
pub const DEFAULT_SINK_TIMEOUT_MS: u64 = 1000;

/// Default MongoDB connection string.
pub const DEFAULT_MONGODB_URI: &str = "mongodb://localhost:27017";

/// Default MongoDB database.
pub const DEFAULT_MONGODB_DATABASE: &str = "indexer";

/// Default Kafka broker address.
pub const DEFAULT_KAFKA_BROKER: &str = "localhost:9092";

/// Default Kafka consumer group ID.
pub const DEFAULT_KAFKA_GROUP_ID: &str = "collection-indexer";

/// Default Kafka topic carrying index events.
pub const DEFAULT_KAFKA_TOPIC: &str = "index.events";

/// Default directory of index definition files.
pub const DEFAULT_DEFINITION_PATH: &str = "./definitions";

/// Default charset of index definition files.
pub const DEFAULT_DEFINITION_CHARSET: &str = "utf-8";

/// Default spill directory.
pub const DEFAULT_SPILL_PATH: &str = "./spill";

/// OpenSearch bulk sink settings.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Applied to every bulk request.
    pub timeout: Duration,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OPENSEARCH_URL.to_string(),
            username: None,
            password: None,
            timeout: Duration::from_millis(DEFAULT_SINK_TIMEOUT_MS),
        }
    }
}

/// MongoDB settings.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_MONGODB_URI.to_string(),
            database: DEFAULT_MONGODB_DATABASE.to_string(),
        }
    }
}

/// Kafka settings.
#[derive(Debug, Clone)]
pub struct BusConfig {
    pub brokers: String,
    pub group_id: String,
    pub topic: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            brokers: DEFAULT_KAFKA_BROKER.to_string(),
            group_id: DEFAULT_KAFKA_GROUP_ID.to_string(),
            topic: DEFAULT_KAFKA_TOPIC.to_string(),
        }
    }
}

/// Index definition file settings.
#[derive(Debug, Clone)]
pub struct DefinitionConfig {
    pub path: PathBuf,
    /// WHATWG encoding label, e.g. `utf-8` or `windows-1251`.
    pub charset: String,
}

impl Default for DefinitionConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DEFINITION_PATH),
            charset: DEFAULT_DEFINITION_CHARSET.to_string(),
        }
    }
}
