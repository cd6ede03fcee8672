//! Broker message types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message read from a topic partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// `None` for tombstones / empty values
    pub payload: Option<Vec<u8>>,
    /// Broker timestamp in milliseconds, when available
    pub timestamp: Option<i64>,
}

impl TopicMessage {
    /// Offset to resume from once this message is done
    pub fn next_offset(&self) -> i64 {
        self.offset + 1
    }
}

/// A message that could not be persisted, with the reason
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadLetter {
    /// Original payload bytes
    pub original_message: Vec<u8>,
    /// Human-readable reason
    pub error: String,
    /// Error category (see `Error::kind`)
    pub error_type: String,
    /// Source topic
    pub source_topic: String,
    /// Source partition
    pub partition: i32,
    /// Source offset
    pub offset: i64,
    /// When the failure was observed
    pub timestamp: DateTime<Utc>,
}

impl DeadLetter {
    /// Build a dead letter for a message and the error it caused
    pub fn new(message: &TopicMessage, error: &crate::Error) -> Self {
        Self {
            original_message: message.payload.clone().unwrap_or_default(),
            error: error.to_string(),
            error_type: error.kind().to_string(),
            source_topic: message.topic.clone(),
            partition: message.partition,
            offset: message.offset,
            timestamp: Utc::now(),
        }
    }

    /// Payload as text, lossy for non-UTF-8 bytes
    pub fn payload_text(&self) -> String {
        String::from_utf8_lossy(&self.original_message).into_owned()
    }
}
