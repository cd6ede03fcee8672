//! Producing side of the broker
//!
//! `MessageProducer` is the narrow client seam; `KafkaProducer` implements it
//! over rdkafka and `Publisher` binds a producer to the user topic.

use crate::error::{Error, Result};
use crate::record::NormalizedUserRecord;
use crate::types::DeliveryMode;
use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default topic carrying normalized user records
pub const DEFAULT_TOPIC: &str = "users_created";

/// Raw byte producer
#[async_trait]
pub trait MessageProducer: Send + Sync {
    /// Send one value (no key, no headers) to a topic
    async fn send(&self, topic: &str, payload: &[u8]) -> Result<()>;

    /// Wait for queued messages to be delivered
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Settings for [`KafkaProducer`]
#[derive(Debug, Clone)]
pub struct KafkaProducerConfig {
    pub brokers: Vec<String>,
    pub delivery: DeliveryMode,
    /// How long `Confirm` mode waits for an acknowledgment
    pub confirm_timeout: Duration,
    /// Extra librdkafka settings
    pub extra: HashMap<String, String>,
}

impl Default for KafkaProducerConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["localhost:9092".to_string()],
            delivery: DeliveryMode::default(),
            confirm_timeout: Duration::from_secs(10),
            extra: HashMap::new(),
        }
    }
}

/// Kafka producer handle
pub struct KafkaProducer {
    producer: FutureProducer,
    delivery: DeliveryMode,
    confirm_timeout: Duration,
}

impl KafkaProducer {
    /// Create a producer; this validates configuration but does not connect
    pub fn new(config: &KafkaProducerConfig) -> Result<Self> {
        if config.brokers.is_empty() {
            return Err(Error::config("at least one broker address is required"));
        }

        let mut kafka_conf = ClientConfig::new();
        for (k, v) in &config.extra {
            kafka_conf.set(k, v);
        }
        kafka_conf
            .set("bootstrap.servers", config.brokers.join(","))
            .set(
                "message.timeout.ms",
                config.confirm_timeout.as_millis().to_string(),
            );

        let producer: FutureProducer = kafka_conf
            .create()
            .map_err(|e| Error::broker(format!("Failed to create Kafka producer: {e}")))?;

        info!(
            brokers = %config.brokers.join(","),
            delivery = ?config.delivery,
            "Kafka producer created"
        );

        Ok(Self {
            producer,
            delivery: config.delivery,
            confirm_timeout: config.confirm_timeout,
        })
    }
}

#[async_trait]
impl MessageProducer for KafkaProducer {
    async fn send(&self, topic: &str, payload: &[u8]) -> Result<()> {
        let record = FutureRecord::<(), [u8]>::to(topic).payload(payload);

        match self.delivery {
            DeliveryMode::Confirm => {
                self.producer
                    .send(record, Timeout::After(self.confirm_timeout))
                    .await
                    .map_err(|(e, _)| {
                        Error::broker(format!("Delivery to '{topic}' not confirmed: {e}"))
                    })?;
                debug!(topic, "Message delivery confirmed");
            }
            DeliveryMode::FireAndForget => {
                // the delivery future is dropped; librdkafka still delivers in the background
                let _ = self.producer.send_result(record).map_err(|(e, _)| {
                    Error::broker(format!("Failed to enqueue message for '{topic}': {e}"))
                })?;
                debug!(topic, "Message enqueued");
            }
        }

        Ok(())
    }

    async fn flush(&self) -> Result<()> {
        self.producer
            .flush(Timeout::After(self.confirm_timeout))
            .map_err(|e| Error::broker(format!("Failed to flush producer: {e}")))
    }
}

impl std::fmt::Debug for KafkaProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaProducer")
            .field("delivery", &self.delivery)
            .field("confirm_timeout", &self.confirm_timeout)
            .finish_non_exhaustive()
    }
}

/// Publishes normalized records to the user topic
#[derive(Clone)]
pub struct Publisher {
    producer: Arc<dyn MessageProducer>,
    topic: String,
}

impl Publisher {
    /// Bind a producer to a topic
    pub fn new(producer: Arc<dyn MessageProducer>, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }

    /// Target topic
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Serialize and send one record
    pub async fn publish(&self, record: &NormalizedUserRecord) -> Result<()> {
        let payload = record.to_payload()?;
        self.producer.send(&self.topic, &payload).await?;
        info!(topic = %self.topic, username = %record.username, "Published user record");
        Ok(())
    }

    /// Flush the underlying producer
    pub async fn flush(&self) -> Result<()> {
        self.producer.flush().await
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("topic", &self.topic)
            .finish_non_exhaustive()
    }
}
