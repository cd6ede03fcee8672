//! Consuming side of the broker
//!
//! Partitions are assigned manually: positions come from our own checkpoint
//! store, not from consumer-group commits, so a restart resumes after the
//! last persisted row.

use super::types::TopicMessage;
use crate::error::{Error, Result};
use crate::state::CheckpointState;
use crate::types::StartingOffsets;
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message as _;
use rdkafka::{Offset, TopicPartitionList};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A stream of topic messages
#[async_trait]
pub trait MessageSource: Send {
    /// Next message, or `None` when the source is exhausted
    ///
    /// Broker-backed sources never return `None`; they wait.
    async fn next_message(&mut self) -> Result<Option<TopicMessage>>;
}

/// Where one partition starts reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    Beginning,
    End,
    At(i64),
}

impl From<StartPosition> for Offset {
    fn from(position: StartPosition) -> Self {
        match position {
            StartPosition::Beginning => Offset::Beginning,
            StartPosition::End => Offset::End,
            StartPosition::At(offset) => Offset::Offset(offset),
        }
    }
}

/// Decide where a partition starts
///
/// A checkpointed offset below the low watermark means retention evicted
/// messages we never persisted. That is fatal unless data loss is tolerated,
/// in which case reading resumes at the oldest retained message.
pub fn resolve_start(
    topic: &str,
    partition: i32,
    checkpointed: Option<i64>,
    low_watermark: i64,
    starting_offsets: StartingOffsets,
    fail_on_data_loss: bool,
) -> Result<StartPosition> {
    let Some(offset) = checkpointed else {
        return Ok(match starting_offsets {
            StartingOffsets::Earliest => StartPosition::Beginning,
            StartingOffsets::Latest => StartPosition::End,
        });
    };

    if offset >= low_watermark {
        return Ok(StartPosition::At(offset));
    }

    if fail_on_data_loss {
        return Err(Error::broker(format!(
            "{topic}/{partition}: checkpoint offset {offset} is below the oldest retained \
             offset {low_watermark}; {} messages were lost",
            low_watermark - offset
        )));
    }

    warn!(
        topic,
        partition,
        checkpoint = offset,
        low_watermark,
        "Checkpointed messages were evicted by retention, resuming at oldest retained offset"
    );
    Ok(StartPosition::At(low_watermark))
}

/// Settings for [`KafkaSubscriber`]
#[derive(Debug, Clone)]
pub struct KafkaSubscriberConfig {
    pub brokers: Vec<String>,
    pub topic: String,
    pub group_id: String,
    pub starting_offsets: StartingOffsets,
    pub fail_on_data_loss: bool,
    /// Timeout for metadata and watermark lookups
    pub metadata_timeout: Duration,
    /// Extra librdkafka settings
    pub extra: HashMap<String, String>,
}

/// Kafka-backed message source
pub struct KafkaSubscriber {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaSubscriber {
    /// Create a consumer and assign every partition of the topic
    pub fn connect(config: &KafkaSubscriberConfig, checkpoint: &CheckpointState) -> Result<Self> {
        if config.brokers.is_empty() {
            return Err(Error::config("at least one broker address is required"));
        }

        let mut kafka_conf = ClientConfig::new();
        for (k, v) in &config.extra {
            kafka_conf.set(k, v);
        }
        kafka_conf
            .set("bootstrap.servers", config.brokers.join(","))
            .set("group.id", &config.group_id)
            .set("auto.offset.reset", config.starting_offsets.as_str())
            .set("enable.auto.commit", "false")
            .set("enable.partition.eof", "false");

        let consumer: StreamConsumer = kafka_conf
            .create()
            .map_err(|e| Error::broker(format!("Failed to create Kafka consumer: {e}")))?;

        let metadata = consumer
            .fetch_metadata(Some(config.topic.as_str()), config.metadata_timeout)
            .map_err(|e| Error::broker(format!("Failed to fetch metadata: {e}")))?;

        let partitions: Vec<i32> = metadata
            .topics()
            .iter()
            .find(|t| t.name() == config.topic)
            .map(|t| t.partitions().iter().map(|p| p.id()).collect())
            .unwrap_or_default();

        if partitions.is_empty() {
            return Err(Error::broker(format!(
                "Topic '{}' has no partitions (does it exist?)",
                config.topic
            )));
        }

        let mut assignment = TopicPartitionList::with_capacity(partitions.len());
        for partition in partitions {
            let checkpointed = checkpoint.get_offset(&config.topic, partition);
            let low_watermark = match checkpointed {
                Some(_) => {
                    let (low, _high) = consumer
                        .fetch_watermarks(&config.topic, partition, config.metadata_timeout)
                        .map_err(|e| {
                            Error::broker(format!(
                                "Failed to fetch watermarks for {}/{partition}: {e}",
                                config.topic
                            ))
                        })?;
                    low
                }
                None => 0,
            };

            let start = resolve_start(
                &config.topic,
                partition,
                checkpointed,
                low_watermark,
                config.starting_offsets,
                config.fail_on_data_loss,
            )?;
            debug!(topic = %config.topic, partition, ?start, "Assigning partition");

            assignment
                .add_partition_offset(&config.topic, partition, start.into())
                .map_err(|e| Error::broker(format!("Invalid start offset: {e}")))?;
        }

        consumer
            .assign(&assignment)
            .map_err(|e| Error::broker(format!("Failed to assign partitions: {e}")))?;

        info!(
            topic = %config.topic,
            partitions = assignment.count(),
            starting_offsets = %config.starting_offsets,
            "Kafka subscription started"
        );

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
        })
    }

    /// Subscribed topic
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl MessageSource for KafkaSubscriber {
    async fn next_message(&mut self) -> Result<Option<TopicMessage>> {
        let msg = self
            .consumer
            .recv()
            .await
            .map_err(|e| Error::broker(format!("Failed to receive message: {e}")))?;

        Ok(Some(TopicMessage {
            topic: msg.topic().to_owned(),
            partition: msg.partition(),
            offset: msg.offset(),
            payload: msg.payload().map(<[u8]>::to_vec),
            timestamp: msg.timestamp().to_millis(),
        }))
    }
}

impl std::fmt::Debug for KafkaSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaSubscriber")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}
