//! In-process broker
//!
//! A single-partition, append-only log per topic. Used by tests and by
//! dry runs that exercise the whole pipeline without Kafka.

use super::consumer::MessageSource;
use super::publisher::MessageProducer;
use super::types::TopicMessage;
use crate::error::{Error, Result};
use crate::state::CheckpointState;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The only partition of every in-memory topic
pub const MEMORY_PARTITION: i32 = 0;

/// Shared in-memory topic log
#[derive(Debug, Clone, Default)]
pub struct MemoryBroker {
    topics: Arc<Mutex<HashMap<String, Vec<Vec<u8>>>>>,
}

impl MemoryBroker {
    /// Create an empty broker
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a payload, returning its offset
    pub fn append(&self, topic: &str, payload: Vec<u8>) -> Result<i64> {
        let mut topics = self.lock()?;
        let log = topics.entry(topic.to_string()).or_default();
        log.push(payload);
        Ok(log.len() as i64 - 1)
    }

    /// Number of messages in a topic
    pub fn len(&self, topic: &str) -> usize {
        self.lock()
            .map(|topics| topics.get(topic).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Whether a topic has no messages
    pub fn is_empty(&self, topic: &str) -> bool {
        self.len(topic) == 0
    }

    /// Copy of every payload in a topic
    pub fn messages(&self, topic: &str) -> Vec<Vec<u8>> {
        self.lock()
            .map(|topics| topics.get(topic).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Read a topic from a given offset
    pub fn subscribe(&self, topic: &str, from_offset: i64) -> MemorySubscriber {
        MemorySubscriber {
            broker: self.clone(),
            topic: topic.to_string(),
            position: from_offset.max(0),
        }
    }

    /// Read a topic from its checkpoint, or from the beginning
    pub fn subscribe_from(&self, topic: &str, checkpoint: &CheckpointState) -> MemorySubscriber {
        let offset = checkpoint
            .get_offset(topic, MEMORY_PARTITION)
            .unwrap_or(0);
        self.subscribe(topic, offset)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<Vec<u8>>>>> {
        self.topics
            .lock()
            .map_err(|_| Error::broker("in-memory broker lock poisoned"))
    }
}

#[async_trait]
impl MessageProducer for MemoryBroker {
    async fn send(&self, topic: &str, payload: &[u8]) -> Result<()> {
        self.append(topic, payload.to_vec()).map(|_| ())
    }
}

/// Reader over one in-memory topic
///
/// Returns `None` once it has caught up with the log.
#[derive(Debug)]
pub struct MemorySubscriber {
    broker: MemoryBroker,
    topic: String,
    position: i64,
}

#[async_trait]
impl MessageSource for MemorySubscriber {
    async fn next_message(&mut self) -> Result<Option<TopicMessage>> {
        let payload = {
            let topics = self.broker.lock()?;
            topics
                .get(&self.topic)
                .and_then(|log| log.get(self.position as usize))
                .cloned()
        };

        Ok(payload.map(|payload| {
            let offset = self.position;
            self.position += 1;
            TopicMessage {
                topic: self.topic.clone(),
                partition: MEMORY_PARTITION,
                offset,
                payload: (!payload.is_empty()).then_some(payload),
                timestamp: None,
            }
        }))
    }
}
