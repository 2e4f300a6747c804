//! HTTP API: refresh requests, single-document events and task status.
pub mod handlers;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use self::state::AppState;
use crate::orchestrator::Orchestrator;

pub use handlers::ApiError;

fn create_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE])
}

/// Create the Axum application router with all routes and middleware
pub fn create_app(orchestrator: Arc<Orchestrator>) -> Router {
    let state = AppState { orchestrator };

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/tasks", get(handlers::list_tasks))
        .route("/api/index/refresh/:name", post(handlers::refresh_index))
        .route("/api/index/refresh/:name/:type", post(handlers::refresh_index))
        .route(
            "/api/index/:id/:name",
            put(handlers::index_document).delete(handlers::delete_document),
        )
        .route(
            "/api/index/:id/:name/:type",
            put(handlers::index_document).delete(handlers::delete_document),
        )
        .layer(create_cors_layer())
        .with_state(state)
}

/// Serve the API until `shutdown` is cancelled
pub async fn run_server(
    app: Router,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);
    info!("- Refresh endpoint: http://{}/api/index/refresh/{{name}}[/{{type}}]", addr);
    info!("- Tasks endpoint: http://{}/api/tasks", addr);
    info!("- Health endpoint: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
