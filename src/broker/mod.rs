//! Message broker module
//!
//! Narrow client interfaces over the broker, with a Kafka implementation
//! (rdkafka) and an in-process one.
//!
//! # Overview
//!
//! - `MessageProducer` / `Publisher` - send records to the user topic
//! - `MessageSource` / `KafkaSubscriber` - read the topic from a checkpoint
//! - `MemoryBroker` - single-partition in-memory topics
//! - `DeadLetterSink` - error channel for rejected messages

mod consumer;
mod dead_letter;
mod memory;
mod publisher;
mod types;

pub use consumer::{
    resolve_start, KafkaSubscriber, KafkaSubscriberConfig, MessageSource, StartPosition,
};
pub use dead_letter::{DeadLetterSink, LogDeadLetters, TopicDeadLetters};
pub use memory::{MemoryBroker, MemorySubscriber, MEMORY_PARTITION};
pub use publisher::{
    KafkaProducer, KafkaProducerConfig, MessageProducer, Publisher, DEFAULT_TOPIC,
};
pub use types::{DeadLetter, TopicMessage};
