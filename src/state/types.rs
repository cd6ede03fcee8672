//! Checkpoint types
//!
//! These types are serialized to JSON and persisted between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Subscription progress across topics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointState {
    /// Per-topic progress
    #[serde(default)]
    pub topics: HashMap<String, TopicCheckpoint>,
}

impl CheckpointState {
    /// Create a new empty checkpoint
    pub fn new() -> Self {
        Self::default()
    }

    /// Get progress for a topic
    pub fn get_topic(&self, topic: &str) -> Option<&TopicCheckpoint> {
        self.topics.get(topic)
    }

    /// Get mutable progress for a topic, creating if needed
    pub fn get_topic_mut(&mut self, topic: &str) -> &mut TopicCheckpoint {
        self.topics.entry(topic.to_string()).or_default()
    }

    /// Next offset to read for a partition
    pub fn get_offset(&self, topic: &str, partition: i32) -> Option<i64> {
        self.topics.get(topic)?.partitions.get(&partition).copied()
    }

    /// Record the next offset to read for a partition
    ///
    /// Positions never move backwards; a stale update is ignored.
    pub fn set_offset(&mut self, topic: &str, partition: i32, next_offset: i64) -> bool {
        let checkpoint = self.get_topic_mut(topic);
        let current = checkpoint.partitions.entry(partition).or_insert(next_offset);
        if next_offset < *current {
            return false;
        }
        *current = next_offset;
        checkpoint.updated_at = Some(Utc::now());
        true
    }
}

/// Progress for a single topic
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicCheckpoint {
    /// Next offset to read, by partition
    #[serde(default)]
    pub partitions: BTreeMap<i32, i64>,

    /// When any partition last advanced
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
