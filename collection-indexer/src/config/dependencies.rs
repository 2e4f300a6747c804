//! Dependency initialization and wiring for the collection indexer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use collection_indexer_repository::{
    FileDefinitionRepository, FileSpillStore, KafkaMessageBus, MongoDataStore, OpenSearchSink,
    SinkConfig,
};
use tokio::time::sleep;
use tracing::{info, warn};

use super::settings::{ConnectionMode, PipelineConfig, ServiceConfig};
use crate::orchestrator::{Collaborators, Orchestrator};
use crate::IndexingError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to start tasks.
    pub orchestrator: Arc<Orchestrator>,
    /// Address the HTTP API listens on.
    pub api_bind_addr: SocketAddr,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`ServiceConfig::from_env`] and [`PipelineConfig::from_env`] for
    /// the recognized variables.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails (OpenSearch only in fail-fast mode)
    pub async fn new() -> Result<Self, IndexingError> {
        Self::with_config(ServiceConfig::from_env(), PipelineConfig::from_env()).await
    }

    /// Initialize all dependencies from explicit configuration.
    pub async fn with_config(
        service: ServiceConfig,
        pipeline: PipelineConfig,
    ) -> Result<Self, IndexingError> {
        info!(
            opensearch_url = %service.sink.url,
            mongodb_database = %service.store.database,
            kafka_broker = %service.bus.brokers,
            kafka_topic = %service.bus.topic,
            definitions = %service.definitions.path.display(),
            spill_path = %service.spill_path.display(),
            connection_mode = ?service.connection_mode,
            retry_interval_secs = service.retry_interval.as_secs(),
            batch_max_size = pipeline.batch_max_size,
            parallelism = pipeline.parallelism,
            "Initializing dependencies"
        );

        // Initialize OpenSearch sink with retry logic
        let sink = Self::connect_to_opensearch(
            &service.sink,
            service.connection_mode,
            service.retry_interval,
        )
        .await?;
        info!("OpenSearch connection established");

        let store = MongoDataStore::connect(&service.store)
            .await
            .map_err(|e| IndexingError::config(format!("Failed to connect to MongoDB: {}", e)))?;
        info!("MongoDB connection established");

        let bus = KafkaMessageBus::new(&service.bus)
            .map_err(|e| {
                IndexingError::config(format!("Failed to create Kafka message bus: {}", e))
            })?;
        info!("Kafka message bus created");

        let definitions = FileDefinitionRepository::new(&service.definitions)
            .map_err(|e| {
                IndexingError::config(format!("Failed to open index definitions: {}", e))
            })?;
        let spill = FileSpillStore::new(service.spill_path.clone());

        let orchestrator = Orchestrator::new(
            Collaborators {
                store: Arc::new(store),
                sink: Arc::new(sink),
                bus: Arc::new(bus),
                definitions: Arc::new(definitions),
                spill: Arc::new(spill),
            },
            pipeline,
        );

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            api_bind_addr: service.api_bind_addr,
        })
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        config: &SinkConfig,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchSink, IndexingError> {
        loop {
            match Self::try_connect_opensearch(config).await {
                Ok(sink) => return Ok(sink),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(IndexingError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %config.url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Attempt to connect to OpenSearch.
    async fn try_connect_opensearch(config: &SinkConfig) -> Result<OpenSearchSink, IndexingError> {
        let sink = OpenSearchSink::new(config)
            .map_err(|e| {
                IndexingError::config(format!("Failed to create OpenSearch sink: {}", e))
            })?;
        sink.ping()
            .await
            .map_err(|e| IndexingError::config(format!("OpenSearch did not answer: {}", e)))?;
        Ok(sink)
    }
}
