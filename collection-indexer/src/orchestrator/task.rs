//! Indexing tasks and the registry of active ones.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// What a task indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaskKind {
    /// Follows the event bus for the life of the service.
    Incremental,
    /// Re-indexes one whole collection.
    Refresh {
        index: String,
        #[serde(rename = "type")]
        index_type: Option<String>,
    },
}

/// A running indexing task with its progress counters.
#[derive(Debug)]
pub struct IndexTask {
    id: Uuid,
    kind: TaskKind,
    started_at: DateTime<Utc>,
    last_activity_ms: AtomicI64,
    documents_read: AtomicU64,
    documents_written: AtomicU64,
    cancellation: CancellationToken,
}

impl IndexTask {
    pub fn new(kind: TaskKind) -> Self {
        let started_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            started_at,
            last_activity_ms: AtomicI64::new(started_at.timestamp_millis()),
            documents_read: AtomicU64::new(0),
            documents_written: AtomicU64::new(0),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn is_incremental(&self) -> bool {
        self.kind == TaskKind::Incremental
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_activity_ms.load(Ordering::Relaxed))
            .unwrap_or(self.started_at)
    }

    pub fn documents_read(&self) -> u64 {
        self.documents_read.load(Ordering::Relaxed)
    }

    pub fn documents_written(&self) -> u64 {
        self.documents_written.load(Ordering::Relaxed)
    }

    /// Count entries flushed into a batch.
    pub fn add_documents_read(&self, count: u64) -> u64 {
        self.touch();
        self.documents_read.fetch_add(count, Ordering::Relaxed) + count
    }

    /// Count bulk items acknowledged by the search engine.
    pub fn add_documents_written(&self, count: u64) -> u64 {
        self.touch();
        self.documents_written.fetch_add(count, Ordering::Relaxed) + count
    }

    fn touch(&self) {
        self.last_activity_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            kind: self.kind.clone(),
            started: self.started_at,
            last_activity: self.last_activity(),
            documents_read: self.documents_read(),
            documents_written: self.documents_written(),
        }
    }
}

/// Point-in-time view of a task, as reported by the API.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: TaskKind,
    pub started: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub documents_read: u64,
    pub documents_written: u64,
}

/// Active tasks keyed by id.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<Uuid, Arc<IndexTask>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, task: Arc<IndexTask>) {
        self.tasks.lock().await.insert(task.id(), task);
    }

    pub async fn remove(&self, id: Uuid) -> Option<Arc<IndexTask>> {
        self.tasks.lock().await.remove(&id)
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<IndexTask>> {
        self.tasks.lock().await.get(&id).cloned()
    }

    /// All active tasks, oldest first.
    pub async fn list(&self) -> Vec<Arc<IndexTask>> {
        let mut tasks: Vec<Arc<IndexTask>> = self.tasks.lock().await.values().cloned().collect();
        tasks.sort_by_key(|task| task.started_at());
        tasks
    }

    pub async fn cancel_all(&self) {
        for task in self.tasks.lock().await.values() {
            task.cancel();
        }
    }
}
