//! Mock collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bson::{doc, oid::ObjectId, Document};
use collection_indexer::config::PipelineConfig;
use collection_indexer::orchestrator::{Collaborators, Orchestrator};
use collection_indexer_repository::{
    BulkAck, DataStore, DocumentStream, IndexDefinitionRepository, MessageBus, RepositoryError,
    SearchSink, SinkError, SpillStore,
};
use collection_indexer_shared::IndexEvent;
use futures::stream::{self, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;

pub const BOOK_IDS: [&str; 3] = [
    "65a1b2c3d4e5f60718293a01",
    "65a1b2c3d4e5f60718293a02",
    "65a1b2c3d4e5f60718293a03",
];

pub fn book(id: &str, title: &str) -> Document {
    doc! {
        "_id": ObjectId::parse_str(id).unwrap(),
        "title": title,
        "pages": 100,
    }
}

// Mock document store serving fixed collections
pub struct MockStore {
    collections: HashMap<String, Vec<Document>>,
    pub finds: Mutex<Vec<(String, Document)>>,
}

impl MockStore {
    pub fn new(collections: Vec<(&str, Vec<Document>)>) -> Self {
        Self {
            collections: collections
                .into_iter()
                .map(|(name, documents)| (name.to_string(), documents))
                .collect(),
            finds: Mutex::new(Vec::new()),
        }
    }

    pub fn books() -> Self {
        Self::new(vec![(
            "book",
            vec![
                book(BOOK_IDS[0], "Dune"),
                book(BOOK_IDS[1], "Solaris"),
                book(BOOK_IDS[2], "Roadside Picnic"),
            ],
        )])
    }
}

#[async_trait::async_trait]
impl DataStore for MockStore {
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        _projection: Option<Document>,
    ) -> Result<Vec<Document>, RepositoryError> {
        self.finds
            .lock()
            .unwrap()
            .push((collection.to_string(), filter.clone()));
        let documents = self.collections.get(collection).cloned().unwrap_or_default();
        Ok(documents
            .into_iter()
            .filter(|document| filter.iter().all(|(key, value)| document.get(key) == Some(value)))
            .collect())
    }

    async fn scan(
        &self,
        collection: &str,
        _projection: Option<Document>,
    ) -> Result<DocumentStream, RepositoryError> {
        let documents = self.collections.get(collection).cloned().unwrap_or_default();
        Ok(stream::iter(documents.into_iter().map(Ok)).boxed())
    }
}

// Mock search sink recording every payload
pub struct MockSink {
    responses: Mutex<VecDeque<Result<BulkAck, SinkError>>>,
    pub payloads: Mutex<Vec<String>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(responses: Vec<Result<BulkAck, SinkError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            payloads: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        let responses = (0..16).map(|_| Err(SinkError::from_status(status, "rejected"))).collect();
        Self::scripted(responses)
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads.lock().unwrap().clone()
    }

    /// Action header lines across every payload received so far.
    pub fn headers(&self) -> Vec<String> {
        self.payloads()
            .iter()
            .flat_map(|payload| payload.lines().map(str::to_string).collect::<Vec<_>>())
            .filter(|line| is_header(line))
            .collect()
    }
}

fn is_header(line: &str) -> bool {
    line.starts_with(r#"{"index":{"_index""#) || line.starts_with(r#"{"delete":{"_index""#)
}

#[async_trait::async_trait]
impl SearchSink for MockSink {
    async fn bulk(&self, payload: &str) -> Result<BulkAck, SinkError> {
        self.payloads.lock().unwrap().push(payload.to_string());
        let scripted = self.responses.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(BulkAck {
                status: 200,
                items: payload.lines().filter(|line| is_header(line)).count(),
                errors: false,
            })
        })
    }
}

// Mock message bus fed by the test through a channel
pub struct MockBus {
    inbound: tokio::sync::Mutex<Option<mpsc::Receiver<Vec<u8>>>>,
    pub published: Mutex<Vec<IndexEvent>>,
}

impl MockBus {
    pub fn new() -> (mpsc::Sender<Vec<u8>>, Self) {
        let (sender, receiver) = mpsc::channel(64);
        let bus = Self {
            inbound: tokio::sync::Mutex::new(Some(receiver)),
            published: Mutex::new(Vec::new()),
        };
        (sender, bus)
    }

    pub fn published(&self) -> Vec<IndexEvent> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MessageBus for MockBus {
    async fn publish(&self, event: &IndexEvent) -> Result<(), RepositoryError> {
        self.published.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn consume(&self, sender: mpsc::Sender<Vec<u8>>) -> Result<(), RepositoryError> {
        let Some(mut inbound) = self.inbound.lock().await.take() else {
            return Err(RepositoryError::bus("already consuming"));
        };
        loop {
            tokio::select! {
                _ = sender.closed() => return Ok(()),
                payload = inbound.recv() => match payload {
                    Some(payload) => {
                        if sender.send(payload).await.is_err() {
                            return Ok(());
                        }
                    }
                    None => {
                        sender.closed().await;
                        return Ok(());
                    }
                },
            }
        }
    }
}

// Mock definition repository knowing only the "books" index
pub struct MockDefinitions;

pub fn books_definition(index_type: Option<&str>) -> Value {
    json!({
        "index": "books",
        "type": index_type.unwrap_or_default(),
        "source": {
            "collection": "book",
            "fields": ["title"],
            "summaryField": {"fields": ["title", "pages"], "separator": " / ", "as": "all"}
        }
    })
}

#[async_trait::async_trait]
impl IndexDefinitionRepository for MockDefinitions {
    async fn load(
        &self,
        name: &str,
        index_type: Option<&str>,
    ) -> Result<Option<Value>, RepositoryError> {
        Ok((name == "books").then(|| books_definition(index_type)))
    }
}

// Mock spill store keeping payloads in memory
pub struct MockSpill {
    pub stored: Mutex<Vec<String>>,
}

impl MockSpill {
    pub fn with(payloads: Vec<String>) -> Self {
        Self {
            stored: Mutex::new(payloads),
        }
    }

    pub fn stored(&self) -> Vec<String> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SpillStore for MockSpill {
    async fn store(&self, payloads: &[String]) -> Result<(), RepositoryError> {
        self.stored.lock().unwrap().extend(payloads.iter().cloned());
        Ok(())
    }

    async fn drain(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(std::mem::take(&mut *self.stored.lock().unwrap()))
    }
}

pub fn fast_config() -> PipelineConfig {
    PipelineConfig {
        batch_max_size: 2,
        batch_max_duration: Duration::from_millis(50),
        parallelism: 2,
        max_processing_requests: 100,
        sleep_over_request: Duration::from_millis(10),
        sleep_cycle_count_max: 0,
        retry_max_attempts: 1,
        retry_min_backoff: Duration::from_millis(20),
        channel_buffer_size: 16,
    }
}

pub struct Harness {
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<MockStore>,
    pub sink: Arc<MockSink>,
    pub bus: Arc<MockBus>,
    pub spill: Arc<MockSpill>,
    pub inbound: mpsc::Sender<Vec<u8>>,
}

impl Harness {
    pub fn new(sink: MockSink, spilled: Vec<String>, config: PipelineConfig) -> Self {
        let store = Arc::new(MockStore::books());
        let sink = Arc::new(sink);
        let (inbound, bus) = MockBus::new();
        let bus = Arc::new(bus);
        let spill = Arc::new(MockSpill::with(spilled));

        let orchestrator = Arc::new(Orchestrator::new(
            Collaborators {
                store: store.clone(),
                sink: sink.clone(),
                bus: bus.clone(),
                definitions: Arc::new(MockDefinitions),
                spill: spill.clone(),
            },
            config,
        ));

        Self {
            orchestrator,
            store,
            sink,
            bus,
            spill,
            inbound,
        }
    }

    pub fn standard() -> Self {
        Self::new(MockSink::new(), Vec::new(), fast_config())
    }

    /// Wait until `condition` holds, polling every 10ms.
    pub async fn wait_for<F>(&self, mut condition: F)
    where
        F: FnMut(&Harness) -> bool,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition(self) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    /// Wait until no task is registered any more.
    pub async fn wait_until_idle(&self) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !self.orchestrator.active_tasks().await.is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("tasks still active");
    }
}
