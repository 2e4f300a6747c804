//! Orchestrator module for the collection indexer.
//!
//! Owns the active tasks and wires their sources through the processor and
//! the loader.

mod task;

pub use task::{IndexTask, TaskKind, TaskRegistry, TaskSnapshot};

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use collection_indexer_repository::{
    DataStore, IndexDefinitionRepository, MessageBus, SearchSink, SpillStore,
};
use collection_indexer_shared::IndexEvent;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::consumer::{EventConsumer, SourceItem};
use crate::errors::{error_chain, IngestError};
use crate::loader::{AdmissionControl, Batcher, BulkLoader, LoaderConfig, SearchLoader};
use crate::processor::DocumentProcessor;
use crate::registry::SchemaRegistry;

/// Collaborators the orchestrator is built from.
pub struct Collaborators {
    pub store: Arc<dyn DataStore>,
    pub sink: Arc<dyn SearchSink>,
    pub bus: Arc<dyn MessageBus>,
    pub definitions: Arc<dyn IndexDefinitionRepository>,
    pub spill: Arc<dyn SpillStore>,
}

/// Orchestrator that coordinates the indexing tasks.
///
/// The orchestrator:
/// - Starts the incremental task and on-demand refresh tasks
/// - Routes items through the resolve, join and transform stages
/// - Hands bulk entries to the loader lane of their task
/// - Reports progress and cancels every task on shutdown
pub struct Orchestrator {
    store: Arc<dyn DataStore>,
    consumer: EventConsumer,
    processor: Arc<DocumentProcessor>,
    loader: SearchLoader,
    tasks: TaskRegistry,
    pipelines: TaskTracker,
    config: PipelineConfig,
}

impl Orchestrator {
    /// Create a new orchestrator with the given collaborators.
    pub fn new(collaborators: Collaborators, config: PipelineConfig) -> Self {
        let Collaborators {
            store,
            sink,
            bus,
            definitions,
            spill,
        } = collaborators;

        let registry = Arc::new(SchemaRegistry::new(definitions));
        let processor = Arc::new(DocumentProcessor::new(Arc::clone(&store), registry));
        let admission = AdmissionControl::new(
            config.max_processing_requests,
            config.sleep_over_request,
            config.sleep_cycle_count_max,
        );
        let bulk = BulkLoader::new(
            sink,
            admission,
            LoaderConfig {
                retry_max_attempts: config.retry_max_attempts,
                retry_min_backoff: config.retry_min_backoff,
            },
        );

        Self {
            store,
            consumer: EventConsumer::new(bus, config.channel_buffer_size),
            processor,
            loader: SearchLoader::new(Arc::new(bulk), spill),
            tasks: TaskRegistry::new(),
            pipelines: TaskTracker::new(),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        self.processor.registry()
    }

    pub fn admission(&self) -> &AdmissionControl {
        self.loader.admission()
    }

    /// Start the task that indexes events from the bus.
    ///
    /// Payloads spilled by an earlier run are replayed first.
    #[instrument(skip(self))]
    pub async fn start_incremental(self: &Arc<Self>) -> Result<Arc<IndexTask>, IngestError> {
        let recovered = self.loader.recover().await;
        let (events, _consumer) = self.consumer.start();
        let source = events.map(SourceItem::Event).boxed();

        let task = Arc::new(IndexTask::new(TaskKind::Incremental));
        self.launch(Arc::clone(&task), source, recovered).await;
        info!(task_id = %task.id(), "Incremental indexing started");
        Ok(task)
    }

    /// Start a task that re-indexes the whole collection behind `(name, index_type)`.
    ///
    /// # Returns
    ///
    /// * `Ok(task)` - The running task
    /// * `Err(IngestError)` - No definition exists or the scan could not start
    #[instrument(skip(self))]
    pub async fn refresh(
        self: &Arc<Self>,
        name: &str,
        index_type: Option<&str>,
    ) -> Result<Arc<IndexTask>, IngestError> {
        let index_type = index_type.filter(|t| !t.is_empty());
        let schema = self.registry().resolve(name, index_type).await?;
        let documents = self.store.scan(schema.collection(), schema.projection()).await?;

        let collection = schema.collection().to_string();
        let source = documents
            .filter_map(move |document| {
                let item = match document {
                    Ok(document) => Some(SourceItem::Scanned {
                        schema: Arc::clone(&schema),
                        document,
                    }),
                    Err(e) => {
                        error!(
                            collection = %collection,
                            error = %error_chain(&e),
                            "Dropping unreadable document"
                        );
                        None
                    }
                };
                future::ready(item)
            })
            .boxed();

        let task = Arc::new(IndexTask::new(TaskKind::Refresh {
            index: name.to_string(),
            index_type: index_type.map(str::to_string),
        }));
        self.launch(Arc::clone(&task), source, Vec::new()).await;
        info!(task_id = %task.id(), index = name, "Index refresh started");
        Ok(task)
    }

    /// Check an event and publish it for the incremental task.
    ///
    /// Fails when no definition exists for the event's index or the id is
    /// not a valid identifier.
    pub async fn submit_event(&self, event: &IndexEvent) -> Result<(), IngestError> {
        self.registry()
            .resolve(&event.index_name, event.index_type.as_deref())
            .await?;
        event.object_id()?;
        self.consumer.publish(event).await
    }

    /// Snapshot of every active task, oldest first.
    pub async fn active_tasks(&self) -> Vec<TaskSnapshot> {
        self.tasks.list().await.iter().map(|task| task.snapshot()).collect()
    }

    pub async fn task(&self, id: Uuid) -> Option<Arc<IndexTask>> {
        self.tasks.get(id).await
    }

    /// Cancel every active task and wait for their pipelines to wind down.
    /// Their unacknowledged payloads are spilled.
    pub async fn shutdown(&self) {
        info!("Cancelling all indexing tasks");
        self.tasks.cancel_all().await;
        self.pipelines.close();
        self.pipelines.wait().await;
    }

    /// Report progress until ctrl-c, then shut down.
    pub async fn run(&self) -> Result<(), IngestError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                future::pending::<()>().await;
            }
            info!("Received shutdown signal");
        })
        .await
    }

    /// Report progress every 10 seconds until `shutdown` completes, then
    /// cancel every task.
    #[instrument(skip_all)]
    pub async fn run_until<F>(&self, shutdown: F) -> Result<(), IngestError>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        let mut progress_timer = interval(Duration::from_secs(10));
        progress_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Track previous values for rate calculation
        let mut previous: HashMap<Uuid, (u64, u64)> = HashMap::new();
        let mut prev_time = tokio::time::Instant::now();

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = progress_timer.tick() => {
                    let now = tokio::time::Instant::now();
                    let elapsed_secs = now.duration_since(prev_time).as_secs_f64();
                    let tasks = self.tasks.list().await;

                    let mut current = HashMap::with_capacity(tasks.len());
                    for task in tasks {
                        let read = task.documents_read();
                        let written = task.documents_written();
                        let (prev_read, prev_written) =
                            previous.get(&task.id()).copied().unwrap_or((0, 0));

                        let rate = |count: u64, prev: u64| {
                            if elapsed_secs > 0.0 {
                                (count.saturating_sub(prev) as f64) / elapsed_secs
                            } else {
                                0.0
                            }
                        };

                        info!(
                            task_id = %task.id(),
                            kind = ?task.kind(),
                            documents_read = read,
                            documents_written = written,
                            read_per_sec = format!("{:.2}", rate(read, prev_read)),
                            written_per_sec = format!("{:.2}", rate(written, prev_written)),
                            in_flight = self.admission().in_flight(),
                            "Indexing progress"
                        );
                        current.insert(task.id(), (read, written));
                    }

                    previous = current;
                    prev_time = now;
                }
            }
        }

        self.shutdown().await;
        info!("Orchestrator shutdown complete");
        Ok(())
    }

    /// Register `task` and spawn its pipeline.
    async fn launch(
        self: &Arc<Self>,
        task: Arc<IndexTask>,
        source: BoxStream<'static, SourceItem>,
        recovered: Vec<String>,
    ) {
        self.tasks.add(Arc::clone(&task)).await;

        let orchestrator = Arc::clone(self);
        self.pipelines.spawn(async move {
            let outcome = orchestrator.drive(Arc::clone(&task), source, recovered).await;
            orchestrator.finish(&task, outcome).await;
        });
    }

    /// Run the concurrent stages into the task's loader lane.
    async fn drive(
        &self,
        task: Arc<IndexTask>,
        source: BoxStream<'static, SourceItem>,
        recovered: Vec<String>,
    ) -> Result<(), IngestError> {
        let (sender, receiver) = mpsc::channel::<String>(self.config.channel_buffer_size);
        let batcher = Batcher::new(
            receiver,
            self.config.batch_max_size,
            self.config.batch_max_duration,
        );

        let stop = task.cancellation().child_token();
        let entries = stage_entries(Arc::clone(&self.processor), source, self.config.parallelism);
        let producer_stop = stop.clone();
        let producer = tokio::spawn(async move {
            tokio::select! {
                _ = producer_stop.cancelled() => debug!("Entry producer stopped"),
                _ = forward(entries, sender) => debug!("Entry source exhausted"),
            }
        });

        let outcome = self.loader.run(Arc::clone(&task), batcher, recovered).await;

        stop.cancel();
        if let Err(e) = producer.await {
            error!(error = %e, "Entry producer failed");
        }
        outcome
    }

    async fn finish(&self, task: &Arc<IndexTask>, outcome: Result<(), IngestError>) {
        info!(
            task_id = %task.id(),
            kind = ?task.kind(),
            start = %task.started_at(),
            end = %chrono::Utc::now(),
            documents_read = task.documents_read(),
            documents_written = task.documents_written(),
            cancelled = task.is_cancelled(),
            "Indexing task finished"
        );

        match outcome {
            Ok(()) => {
                self.tasks.remove(task.id()).await;
            }
            Err(e) => {
                error!(task_id = %task.id(), error = %error_chain(&e), "Indexing task failed");
                // The incremental task stays listed so its failure is visible.
                if !task.is_incremental() {
                    self.tasks.remove(task.id()).await;
                }
            }
        }
    }
}

/// Resolve, join and transform items, `parallelism` at a time per stage.
///
/// Items that fail any stage are logged and dropped.
fn stage_entries(
    processor: Arc<DocumentProcessor>,
    source: BoxStream<'static, SourceItem>,
    parallelism: usize,
) -> BoxStream<'static, String> {
    let parallelism = parallelism.max(1);
    let resolver = Arc::clone(&processor);

    source
        .map(move |item| {
            let resolver = Arc::clone(&resolver);
            async move {
                match resolver.resolve_item(item).await {
                    Ok(resolved) => resolved,
                    Err(e) => {
                        error!(error = %error_chain(&e), "Dropping item that failed to resolve");
                        None
                    }
                }
            }
        })
        .buffer_unordered(parallelism)
        .filter_map(future::ready)
        .map(move |resolved| {
            let processor = Arc::clone(&processor);
            async move {
                let index = resolved.schema.index().to_string();
                match processor.process(resolved).await {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        error!(
                            index = %index,
                            error = %error_chain(&e),
                            "Dropping document that failed to transform"
                        );
                        None
                    }
                }
            }
        })
        .buffer_unordered(parallelism)
        .filter_map(future::ready)
        .boxed()
}

async fn forward(mut entries: BoxStream<'static, String>, sender: mpsc::Sender<String>) {
    while let Some(entry) = entries.next().await {
        if sender.send(entry).await.is_err() {
            break;
        }
    }
}
