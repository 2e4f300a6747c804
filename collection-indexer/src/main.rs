//! Collection Indexer Main Entry Point
//!
//! Starts the incremental indexing task, serves the HTTP API and runs until
//! ctrl-c.

use collection_indexer::api::{create_app, run_server};
use collection_indexer::{Dependencies, IndexingError};
use dotenv::dotenv;
use std::env;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
fn init_tracing() -> Result<(), IndexingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("collection_indexer=info,collection_indexer_repository=info")
    });

    let json_format = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "collection-indexer",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with JSON format"
        );
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).pretty())
            .try_init()
            .map_err(|e| IndexingError::config(format!("Failed to initialize tracing: {}", e)))?;

        info!(
            service_name = "collection-indexer",
            service_version = env!("CARGO_PKG_VERSION"),
            "Tracing initialized with console output"
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), IndexingError> {
    // Load environment variables from .env file
    dotenv().ok();

    init_tracing()?;

    info!("Starting Collection Indexer");

    let deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    let orchestrator = deps.orchestrator;
    orchestrator.start_incremental().await?;

    let server_shutdown = CancellationToken::new();
    let app = create_app(orchestrator.clone());
    let server = tokio::spawn(run_server(app, deps.api_bind_addr, server_shutdown.clone()));

    let outcome = orchestrator.run().await;
    server_shutdown.cancel();

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!(error = %e, "HTTP API failed");
            return Err(IndexingError::server(e.to_string()));
        }
        Err(e) => return Err(IndexingError::server(e.to_string())),
    }

    match outcome {
        Ok(()) => {
            info!("Collection indexer stopped");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Collection indexer failed");
            Err(e.into())
        }
    }
}
