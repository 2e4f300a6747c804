//! HTTP request handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use collection_indexer_shared::{IndexAction, IndexEvent};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::api::state::AppState;
use crate::errors::IngestError;
use crate::orchestrator::TaskSnapshot;

/// Every API failure answers 400 with `{"Error": message}`.
#[derive(Debug)]
pub struct ApiError(String);

impl ApiError {
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        let message = match err {
            IngestError::SchemaError(inner) => inner.to_string(),
            other => other.to_string(),
        };
        Self(message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "Request failed");
        (StatusCode::BAD_REQUEST, Json(json!({ "Error": self.0 }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshPath {
    pub name: String,
    #[serde(rename = "type")]
    pub index_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentPath {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub index_type: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "collection-indexer",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// Active tasks, oldest first
pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<TaskSnapshot>> {
    Json(state.orchestrator.active_tasks().await)
}

/// Start re-indexing a whole collection
pub async fn refresh_index(
    State(state): State<AppState>,
    Path(path): Path<RefreshPath>,
) -> Result<Json<Value>, ApiError> {
    let index_type = path.index_type.filter(|t| !t.is_empty());
    let task = state
        .orchestrator
        .refresh(&path.name, index_type.as_deref())
        .await?;

    info!(task_id = %task.id(), index = %path.name, "Refresh requested");
    Ok(Json(json!({
        "Index refresh": {
            "index": path.name,
            "type": index_type.unwrap_or_default(),
            "task_id": task.id(),
            "started": task.started_at().to_rfc3339(),
        }
    })))
}

/// Queue a document for indexing
pub async fn index_document(
    State(state): State<AppState>,
    Path(path): Path<DocumentPath>,
) -> Result<Json<Value>, ApiError> {
    submit(state, IndexAction::Index, path).await
}

/// Queue a document for removal from the index
pub async fn delete_document(
    State(state): State<AppState>,
    Path(path): Path<DocumentPath>,
) -> Result<Json<Value>, ApiError> {
    submit(state, IndexAction::Delete, path).await
}

async fn submit(
    state: AppState,
    action: IndexAction,
    path: DocumentPath,
) -> Result<Json<Value>, ApiError> {
    let event = IndexEvent::new(action, path.id, path.name, path.index_type);
    state.orchestrator.submit_event(&event).await?;

    Ok(Json(json!({
        "id": event.id,
        "index": event.index_name,
        "type": event.index_type.unwrap_or_default(),
    })))
}
