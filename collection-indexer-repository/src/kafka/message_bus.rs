//! Kafka implementation of [`MessageBus`].

use async_trait::async_trait;
use collection_indexer_shared::IndexEvent;
use futures::StreamExt;
use rdkafka::{
    config::ClientConfig,
    consumer::{CommitMode, Consumer, StreamConsumer},
    error::KafkaResult,
    message::{BorrowedMessage, Message as KafkaMessage},
    producer::{FutureProducer, FutureRecord},
    Offset, TopicPartitionList,
};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::config::BusConfig;
use crate::errors::RepositoryError;
use crate::interfaces::MessageBus;

/// How long `publish` waits for room in the producer queue.
const PUBLISH_QUEUE_TIMEOUT: Duration = Duration::from_secs(5);

/// Message bus publishing and consuming JSON-encoded index events on one topic.
pub struct KafkaMessageBus {
    producer: FutureProducer,
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaMessageBus {
    /// Create the producer and the consumer and subscribe to the topic.
    ///
    /// # Returns
    ///
    /// * `Ok(KafkaMessageBus)` - A bus ready to publish and consume
    /// * `Err(RepositoryError)` - If either client cannot be created
    pub fn new(config: &BusConfig) -> Result<Self, RepositoryError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| RepositoryError::bus(e.to_string()))?;

        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
            .map_err(|e| RepositoryError::bus(e.to_string()))?;

        consumer
            .subscribe(&[config.topic.as_str()])
            .map_err(|e| RepositoryError::bus(e.to_string()))?;

        info!(
            brokers = %config.brokers,
            group_id = %config.group_id,
            topic = %config.topic,
            "Created Kafka message bus"
        );

        Ok(Self {
            producer,
            consumer,
            topic: config.topic.clone(),
        })
    }

    fn commit(&self, topic: &str, partition: i32, offset: i64) -> Result<(), RepositoryError> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(topic, partition, Offset::Offset(offset + 1))
            .map_err(|e| RepositoryError::bus(e.to_string()))?;
        self.consumer
            .commit(&tpl, CommitMode::Async)
            .map_err(|e| RepositoryError::bus(e.to_string()))
    }
}

#[async_trait]
impl MessageBus for KafkaMessageBus {
    #[instrument(skip(self, event), fields(id = %event.id, index = %event.index_name))]
    async fn publish(&self, event: &IndexEvent) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(event)
            .map_err(|e| RepositoryError::serialization(e.to_string()))?;

        let record = FutureRecord::to(&self.topic).key(&event.id).payload(&payload);
        self.producer
            .send(record, PUBLISH_QUEUE_TIMEOUT)
            .await
            .map_err(|(e, _)| RepositoryError::bus(e.to_string()))?;

        debug!(topic = %self.topic, "Published index event");
        Ok(())
    }

    #[instrument(skip(self, sender))]
    async fn consume(&self, sender: mpsc::Sender<Vec<u8>>) -> Result<(), RepositoryError> {
        let mut message_stream = self.consumer.stream();

        loop {
            let next = tokio::select! {
                _ = sender.closed() => None,
                message = message_stream.next() => detach(message),
            };

            let received = match next {
                Some(Ok(received)) => received,
                Some(Err(e)) => {
                    error!(error = %e, "Kafka error");
                    continue;
                }
                None => {
                    info!("Event consumption stopped");
                    return Ok(());
                }
            };

            debug!(
                topic = %received.topic,
                partition = received.partition,
                offset = received.offset,
                "Received message from Kafka"
            );
            if sender.send(received.payload).await.is_err() {
                info!("Event receiver dropped, stopping consumption");
                return Ok(());
            }

            if let Err(e) = self.commit(&received.topic, received.partition, received.offset) {
                error!(error = %e, offset = received.offset, "Failed to commit offset");
            }
        }
    }
}

/// Owned copy of a consumed message.
struct Received {
    payload: Vec<u8>,
    topic: String,
    partition: i32,
    offset: i64,
}

fn detach(message: Option<KafkaResult<BorrowedMessage<'_>>>) -> Option<KafkaResult<Received>> {
    message.map(|result| {
        result.map(|msg| Received {
            payload: msg.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            topic: msg.topic().to_string(),
            partition: msg.partition(),
            offset: msg.offset(),
        })
    })
}
