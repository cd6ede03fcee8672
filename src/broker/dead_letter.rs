//! Error channel for messages that cannot be persisted

use super::publisher::MessageProducer;
use super::types::DeadLetter;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Destination for dead letters
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    /// Record one rejected message
    async fn send(&self, letter: DeadLetter) -> Result<()>;
}

/// Logs the rejection and drops the message
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDeadLetters;

#[async_trait]
impl DeadLetterSink for LogDeadLetters {
    async fn send(&self, letter: DeadLetter) -> Result<()> {
        warn!(
            topic = %letter.source_topic,
            partition = letter.partition,
            offset = letter.offset,
            error_type = %letter.error_type,
            payload = %letter.payload_text(),
            "Dropping message: {}",
            letter.error
        );
        Ok(())
    }
}

/// Publishes rejected messages as JSON to a dead-letter topic
#[derive(Clone)]
pub struct TopicDeadLetters {
    producer: Arc<dyn MessageProducer>,
    topic: String,
}

impl TopicDeadLetters {
    /// Route dead letters to `topic`
    pub fn new(producer: Arc<dyn MessageProducer>, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }

    /// Dead-letter topic name
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl DeadLetterSink for TopicDeadLetters {
    async fn send(&self, letter: DeadLetter) -> Result<()> {
        warn!(
            topic = %letter.source_topic,
            partition = letter.partition,
            offset = letter.offset,
            error_type = %letter.error_type,
            dead_letter_topic = %self.topic,
            "Routing message to dead-letter topic: {}",
            letter.error
        );
        let payload = serde_json::to_vec(&letter)?;
        self.producer.send(&self.topic, &payload).await
    }
}

impl std::fmt::Debug for TopicDeadLetters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicDeadLetters")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}
