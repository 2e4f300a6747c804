//! Consumer module for index events.
//!
//! Bridges the message bus into a stream of decoded [`IndexEvent`]s and
//! publishes events accepted by the HTTP API.

mod messages;

pub use messages::{decode_event, SourceItem};

use std::sync::Arc;

use collection_indexer_repository::MessageBus;
use collection_indexer_shared::IndexEvent;
use futures::stream::{BoxStream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info};

use crate::errors::{error_chain, IngestError};

/// Reads and writes index events on the message bus.
pub struct EventConsumer {
    bus: Arc<dyn MessageBus>,
    buffer_size: usize,
}

impl EventConsumer {
    pub fn new(bus: Arc<dyn MessageBus>, buffer_size: usize) -> Self {
        Self { bus, buffer_size }
    }

    /// Start consuming in the background.
    ///
    /// Payloads that do not decode are logged and skipped. Dropping the
    /// returned stream stops the background consumer.
    pub fn start(&self) -> (BoxStream<'static, IndexEvent>, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel::<Vec<u8>>(self.buffer_size);
        let bus = Arc::clone(&self.bus);

        let handle = tokio::spawn(async move {
            info!("Event consumer started");
            match bus.consume(sender).await {
                Ok(()) => info!("Event consumer stopped"),
                Err(e) => error!(error = %error_chain(&e), "Event consumer failed"),
            }
        });

        let events = ReceiverStream::new(receiver)
            .filter_map(|payload| async move {
                match decode_event(&payload) {
                    Ok(event) => {
                        debug!(id = %event.id, index = %event.index_name, "Received index event");
                        Some(event)
                    }
                    Err(e) => {
                        error!(error = %error_chain(&e), "Dropping undecodable message");
                        None
                    }
                }
            })
            .boxed();

        (events, handle)
    }

    /// Publish an event for the incremental task to pick up.
    pub async fn publish(&self, event: &IndexEvent) -> Result<(), IngestError> {
        self.bus.publish(event).await?;
        info!(
            action = ?event.action,
            id = %event.id,
            index = %event.index_name,
            "Published index event"
        );
        Ok(())
    }
}
