//! Pipeline tuning and service endpoints read from the environment.

use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use collection_indexer_repository::config::{
    DEFAULT_DEFINITION_CHARSET, DEFAULT_DEFINITION_PATH, DEFAULT_KAFKA_BROKER,
    DEFAULT_KAFKA_GROUP_ID, DEFAULT_KAFKA_TOPIC, DEFAULT_MONGODB_DATABASE, DEFAULT_MONGODB_URI,
    DEFAULT_OPENSEARCH_URL, DEFAULT_SINK_TIMEOUT_MS, DEFAULT_SPILL_PATH,
};
use collection_indexer_repository::{BusConfig, DefinitionConfig, SinkConfig, StoreConfig};
use tracing::warn;

const DEFAULT_BATCH_MAX_SIZE: usize = 20;
const DEFAULT_BATCH_MAX_DURATION_MS: u64 = 500;
const DEFAULT_INDEX_PARALLELISM: usize = 2;
const DEFAULT_MAX_PROCESSING_REQUESTS: u64 = 100;
const DEFAULT_SLEEP_OVER_REQUEST_MS: u64 = 100;
const DEFAULT_SLEEP_CYCLE_COUNT_MAX: u32 = 10;
const DEFAULT_SINK_RETRY_MAX_ATTEMPTS: usize = 3;
const DEFAULT_SINK_RETRY_MIN_BACKOFF_SECS: u64 = 2;
const DEFAULT_CHANNEL_BUFFER_SIZE: usize = 1000;

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

const DEFAULT_API_PORT: u16 = 8080;

/// Tuning for every indexing task.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Entries per bulk batch before it is flushed.
    pub batch_max_size: usize,
    /// Age of the first entry after which a partial batch is flushed.
    pub batch_max_duration: Duration,
    /// Worker-pool width of each concurrent stage.
    pub parallelism: usize,
    /// In-flight sink requests above which new requests are delayed.
    pub max_processing_requests: u64,
    pub sleep_over_request: Duration,
    pub sleep_cycle_count_max: u32,
    /// Retries after the first failed sink request.
    pub retry_max_attempts: usize,
    pub retry_min_backoff: Duration,
    /// Capacity of the channels between stages.
    pub channel_buffer_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_max_size: DEFAULT_BATCH_MAX_SIZE,
            batch_max_duration: Duration::from_millis(DEFAULT_BATCH_MAX_DURATION_MS),
            parallelism: DEFAULT_INDEX_PARALLELISM,
            max_processing_requests: DEFAULT_MAX_PROCESSING_REQUESTS,
            sleep_over_request: Duration::from_millis(DEFAULT_SLEEP_OVER_REQUEST_MS),
            sleep_cycle_count_max: DEFAULT_SLEEP_CYCLE_COUNT_MAX,
            retry_max_attempts: DEFAULT_SINK_RETRY_MAX_ATTEMPTS,
            retry_min_backoff: Duration::from_secs(DEFAULT_SINK_RETRY_MIN_BACKOFF_SECS),
            channel_buffer_size: DEFAULT_CHANNEL_BUFFER_SIZE,
        }
    }
}

impl PipelineConfig {
    /// Read the pipeline tuning from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `BATCH_MAX_SIZE` (default: 20)
    /// - `BATCH_MAX_DURATION_MS` (default: 500)
    /// - `INDEX_PARALLELISM` (default: 2)
    /// - `MAX_PROCESSING_REQUESTS` (default: 100)
    /// - `SLEEP_OVER_REQUEST_MS` (default: 100)
    /// - `SLEEP_CYCLE_COUNT_MAX` (default: 10)
    /// - `SINK_RETRY_MAX_ATTEMPTS` (default: 3)
    /// - `SINK_RETRY_MIN_BACKOFF_SECS` (default: 2)
    pub fn from_env() -> Self {
        Self {
            batch_max_size: positive("BATCH_MAX_SIZE", DEFAULT_BATCH_MAX_SIZE),
            batch_max_duration: Duration::from_millis(positive(
                "BATCH_MAX_DURATION_MS",
                DEFAULT_BATCH_MAX_DURATION_MS,
            )),
            parallelism: positive("INDEX_PARALLELISM", DEFAULT_INDEX_PARALLELISM),
            max_processing_requests: positive(
                "MAX_PROCESSING_REQUESTS",
                DEFAULT_MAX_PROCESSING_REQUESTS,
            ),
            sleep_over_request: Duration::from_millis(parse_or(
                "SLEEP_OVER_REQUEST_MS",
                DEFAULT_SLEEP_OVER_REQUEST_MS,
            )),
            sleep_cycle_count_max: parse_or("SLEEP_CYCLE_COUNT_MAX", DEFAULT_SLEEP_CYCLE_COUNT_MAX),
            retry_max_attempts: parse_or(
                "SINK_RETRY_MAX_ATTEMPTS",
                DEFAULT_SINK_RETRY_MAX_ATTEMPTS,
            ),
            retry_min_backoff: Duration::from_secs(parse_or(
                "SINK_RETRY_MIN_BACKOFF_SECS",
                DEFAULT_SINK_RETRY_MIN_BACKOFF_SECS,
            )),
            channel_buffer_size: DEFAULT_CHANNEL_BUFFER_SIZE,
        }
    }
}

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection every retry interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse connection mode from a raw setting.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Anything else falls back to "retry".
    pub fn parse(raw: &str) -> Self {
        match raw.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!(value = raw, "Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }

    fn from_env() -> Self {
        Self::parse(&env::var("OPENSEARCH_CONNECTION_MODE").unwrap_or_else(|_| "retry".to_string()))
    }
}

/// Endpoints and locations of every collaborator.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub sink: SinkConfig,
    pub store: StoreConfig,
    pub bus: BusConfig,
    pub definitions: DefinitionConfig,
    pub spill_path: PathBuf,
    pub api_bind_addr: SocketAddr,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            sink: SinkConfig::default(),
            store: StoreConfig::default(),
            bus: BusConfig::default(),
            definitions: DefinitionConfig::default(),
            spill_path: PathBuf::from(DEFAULT_SPILL_PATH),
            api_bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_API_PORT)),
            connection_mode: ConnectionMode::Retry,
            retry_interval: Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
        }
    }
}

impl ServiceConfig {
    /// Read the service endpoints from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_USER` / `OPENSEARCH_PASSWORD`: basic auth (default: unset)
    /// - `OPENSEARCH_TIMEOUT_MS`: per-request timeout (default: 1000)
    /// - `OPENSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: retry interval in seconds (default: 15)
    /// - `MONGODB_URI` (default: mongodb://localhost:27017)
    /// - `MONGODB_DATABASE` (default: indexer)
    /// - `KAFKA_BROKER` (default: localhost:9092)
    /// - `KAFKA_GROUP_ID` (default: collection-indexer)
    /// - `KAFKA_TOPIC` (default: index.events)
    /// - `INDEX_DEFINITION_PATH` (default: ./definitions)
    /// - `INDEX_DEFINITION_CHARSET` (default: utf-8)
    /// - `SPILL_PATH` (default: ./spill)
    /// - `API_BIND_ADDR` (default: 0.0.0.0:8080)
    pub fn from_env() -> Self {
        Self {
            sink: SinkConfig {
                url: string_or("OPENSEARCH_URL", DEFAULT_OPENSEARCH_URL),
                username: env::var("OPENSEARCH_USER").ok(),
                password: env::var("OPENSEARCH_PASSWORD").ok(),
                timeout: Duration::from_millis(positive(
                    "OPENSEARCH_TIMEOUT_MS",
                    DEFAULT_SINK_TIMEOUT_MS,
                )),
            },
            store: StoreConfig {
                uri: string_or("MONGODB_URI", DEFAULT_MONGODB_URI),
                database: string_or("MONGODB_DATABASE", DEFAULT_MONGODB_DATABASE),
            },
            bus: BusConfig {
                brokers: string_or("KAFKA_BROKER", DEFAULT_KAFKA_BROKER),
                group_id: string_or("KAFKA_GROUP_ID", DEFAULT_KAFKA_GROUP_ID),
                topic: string_or("KAFKA_TOPIC", DEFAULT_KAFKA_TOPIC),
            },
            definitions: DefinitionConfig {
                path: PathBuf::from(string_or("INDEX_DEFINITION_PATH", DEFAULT_DEFINITION_PATH)),
                charset: string_or("INDEX_DEFINITION_CHARSET", DEFAULT_DEFINITION_CHARSET),
            },
            spill_path: PathBuf::from(string_or("SPILL_PATH", DEFAULT_SPILL_PATH)),
            api_bind_addr: parse_or(
                "API_BIND_ADDR",
                SocketAddr::from(([0, 0, 0, 0], DEFAULT_API_PORT)),
            ),
            connection_mode: ConnectionMode::from_env(),
            retry_interval: Duration::from_secs(parse_or(
                "OPENSEARCH_RETRY_INTERVAL_SECS",
                DEFAULT_RETRY_INTERVAL_SECS,
            )),
        }
    }
}

fn string_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match env::var(name) {
        Ok(raw) => parse_value(name, &raw, default),
        Err(_) => default,
    }
}

fn positive<T>(name: &str, default: T) -> T
where
    T: FromStr + Display + PartialOrd + Default + Copy,
{
    let value = parse_or(name, default);
    if value > T::default() {
        value
    } else {
        warn!(
            variable = name,
            value = %value,
            default = %default,
            "Setting must be positive, using default"
        );
        default
    }
}

/// Parse a raw setting, falling back to `default` with a warning.
pub(crate) fn parse_value<T>(name: &str, raw: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!(
                variable = name,
                value = raw,
                default = %default,
                "Invalid setting, using default"
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_mode_parse() {
        assert_eq!(ConnectionMode::parse("fail-fast"), ConnectionMode::FailFast);
        assert_eq!(ConnectionMode::parse("FAIL_FAST"), ConnectionMode::FailFast);
        assert_eq!(ConnectionMode::parse("retry"), ConnectionMode::Retry);
        assert_eq!(ConnectionMode::parse("sometimes"), ConnectionMode::Retry);
    }

    #[test]
    fn test_parse_value_falls_back_on_garbage() {
        assert_eq!(parse_value("BATCH_MAX_SIZE", " 50 ", 20usize), 50);
        assert_eq!(parse_value("BATCH_MAX_SIZE", "fifty", 20usize), 20);
        assert_eq!(
            parse_value("API_BIND_ADDR", "127.0.0.1:9000", SocketAddr::from(([0, 0, 0, 0], 8080))),
            SocketAddr::from(([127, 0, 0, 1], 9000))
        );
    }

    #[test]
    fn test_pipeline_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.batch_max_size, 20);
        assert_eq!(config.batch_max_duration, Duration::from_millis(500));
        assert_eq!(config.max_processing_requests, 100);
        assert_eq!(config.retry_min_backoff, Duration::from_secs(2));
    }
}
