//! Kafka message bus.

mod message_bus;

pub use message_bus::KafkaMessageBus;
