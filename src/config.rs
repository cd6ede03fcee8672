//! Pipeline configuration
//!
//! One YAML document with a section per component. Every field has a
//! default, so an empty file (or no file) yields a runnable local setup.
//! Deployment-specific values can be overridden from the environment.

use crate::broker::{KafkaProducerConfig, KafkaSubscriberConfig, DEFAULT_TOPIC};
use crate::error::{Error, Result};
use crate::http::HttpClientConfig;
use crate::schedule::{default_start_date, Cadence, Scheduler, DEFAULT_DAG_ID, DEFAULT_TASK_ID};
use crate::sink::validate_identifier;
use crate::source::DEFAULT_SOURCE_URL;
use crate::types::{DeliveryMode, IdStrategy, StartingOffsets};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Overrides `source.url`
pub const ENV_SOURCE_URL: &str = "USERFLOW_SOURCE_URL";
/// Overrides `broker.brokers` (comma-separated)
pub const ENV_BROKERS: &str = "USERFLOW_BROKERS";
/// Overrides `storage.path`
pub const ENV_STORAGE_PATH: &str = "USERFLOW_STORAGE_PATH";
/// Overrides `stream.checkpoint_dir`
pub const ENV_CHECKPOINT_DIR: &str = "USERFLOW_CHECKPOINT_DIR";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete pipeline configuration loaded from YAML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Upstream HTTP API
    #[serde(default)]
    pub source: SourceConfig,

    /// Broker connection and publishing
    #[serde(default)]
    pub broker: BrokerConfig,

    /// Subscription options
    #[serde(default)]
    pub stream: StreamConfig,

    /// Column store
    #[serde(default)]
    pub storage: StorageConfig,

    /// Producer schedule
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl PipelineConfig {
    /// Parse a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse pipeline YAML: {e}")))
    }

    /// Read and parse a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Load from an optional file, apply environment overrides, validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `USERFLOW_*` overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from any variable lookup
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup(ENV_SOURCE_URL) {
            debug!(var = ENV_SOURCE_URL, "Overriding source url");
            self.source.url = url;
        }
        if let Some(brokers) = lookup(ENV_BROKERS) {
            debug!(var = ENV_BROKERS, "Overriding broker list");
            self.broker.brokers = brokers
                .split(',')
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(path) = lookup(ENV_STORAGE_PATH) {
            debug!(var = ENV_STORAGE_PATH, "Overriding storage path");
            self.storage.path = path;
        }
        if let Some(dir) = lookup(ENV_CHECKPOINT_DIR) {
            debug!(var = ENV_CHECKPOINT_DIR, "Overriding checkpoint directory");
            self.stream.checkpoint_dir = PathBuf::from(dir);
        }
    }

    /// Check the configuration for values that cannot work
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.source.url)
            .map_err(|e| Error::invalid_config("source.url", e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_config(
                "source.url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        if self.source.timeout_seconds == 0 {
            return Err(Error::invalid_config(
                "source.timeout_seconds",
                "must be greater than zero",
            ));
        }

        if self.broker.brokers.is_empty() {
            return Err(Error::invalid_config(
                "broker.brokers",
                "at least one broker address is required",
            ));
        }
        if self.broker.brokers.iter().any(|b| b.trim().is_empty()) {
            return Err(Error::invalid_config(
                "broker.brokers",
                "broker addresses cannot be empty",
            ));
        }
        if self.broker.topic.is_empty() {
            return Err(Error::invalid_config("broker.topic", "cannot be empty"));
        }
        if self.broker.confirm_timeout_seconds == 0 {
            return Err(Error::invalid_config(
                "broker.confirm_timeout_seconds",
                "must be greater than zero",
            ));
        }

        if self.stream.group_id.is_empty() {
            return Err(Error::invalid_config("stream.group_id", "cannot be empty"));
        }
        if self.stream.checkpoint_dir.as_os_str().is_empty() {
            return Err(Error::invalid_config(
                "stream.checkpoint_dir",
                "cannot be empty",
            ));
        }
        if self.stream.metadata_timeout_seconds == 0 {
            return Err(Error::invalid_config(
                "stream.metadata_timeout_seconds",
                "must be greater than zero",
            ));
        }
        if let Some(dlq) = &self.stream.dead_letter_topic {
            if dlq.is_empty() || *dlq == self.broker.topic {
                return Err(Error::invalid_config(
                    "stream.dead_letter_topic",
                    "must be a non-empty topic other than the user topic",
                ));
            }
        }

        if self.storage.path.is_empty() {
            return Err(Error::invalid_config("storage.path", "cannot be empty"));
        }
        validate_identifier("storage.keyspace", &self.storage.keyspace)?;
        validate_identifier("storage.table", &self.storage.table)?;

        if self.schedule.dag_id.is_empty() || self.schedule.task_id.is_empty() {
            return Err(Error::invalid_config(
                "schedule",
                "dag_id and task_id cannot be empty",
            ));
        }

        Ok(())
    }

    /// HTTP client settings for the source
    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.source.timeout_seconds))
            .build()
    }

    /// Kafka producer settings
    pub fn producer_config(&self) -> KafkaProducerConfig {
        KafkaProducerConfig {
            brokers: self.broker.brokers.clone(),
            delivery: self.broker.delivery,
            confirm_timeout: Duration::from_secs(self.broker.confirm_timeout_seconds),
            extra: self.broker.properties.clone(),
        }
    }

    /// Kafka subscriber settings
    pub fn subscriber_config(&self) -> KafkaSubscriberConfig {
        KafkaSubscriberConfig {
            brokers: self.broker.brokers.clone(),
            topic: self.broker.topic.clone(),
            group_id: self.stream.group_id.clone(),
            starting_offsets: self.stream.starting_offsets,
            fail_on_data_loss: self.stream.fail_on_data_loss,
            metadata_timeout: Duration::from_secs(self.stream.metadata_timeout_seconds),
            extra: self.broker.properties.clone(),
        }
    }

    /// Scheduler for the producer task
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(&self.schedule.dag_id, &self.schedule.task_id)
            .with_cadence(self.schedule.interval)
            .with_start_date(self.schedule.start_date)
    }
}

// ============================================================================
// Source
// ============================================================================

/// Upstream API settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    /// Endpoint returning `{"results": [...]}`
    #[serde(default = "default_source_url")]
    pub url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_source_url() -> String {
    DEFAULT_SOURCE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

// ============================================================================
// Broker
// ============================================================================

/// Broker connection and publish settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokerConfig {
    /// Bootstrap addresses
    #[serde(default = "default_brokers")]
    pub brokers: Vec<String>,

    /// User topic
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Publish acknowledgment mode
    #[serde(default)]
    pub delivery: DeliveryMode,

    /// How long `confirm` delivery waits for an acknowledgment
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_seconds: u64,

    /// Extra librdkafka properties (e.g. `security.protocol`)
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            topic: default_topic(),
            delivery: DeliveryMode::default(),
            confirm_timeout_seconds: default_confirm_timeout(),
            properties: HashMap::new(),
        }
    }
}

fn default_brokers() -> Vec<String> {
    vec!["localhost:9092".to_string()]
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

fn default_confirm_timeout() -> u64 {
    10
}

// ============================================================================
// Stream
// ============================================================================

/// Subscription settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamConfig {
    /// Consumer group id (used for broker-side bookkeeping only)
    #[serde(default = "default_group_id")]
    pub group_id: String,

    /// Where to start when no checkpoint exists
    #[serde(default)]
    pub starting_offsets: StartingOffsets,

    /// Fail when retention evicted messages past the checkpoint
    #[serde(default = "default_true")]
    pub fail_on_data_loss: bool,

    /// Directory holding the offsets file
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: PathBuf,

    /// How persisted rows get their id
    #[serde(default)]
    pub id_strategy: IdStrategy,

    /// Publish rejected messages here instead of only logging them
    #[serde(default)]
    pub dead_letter_topic: Option<String>,

    /// Timeout for metadata and watermark lookups in seconds
    #[serde(default = "default_metadata_timeout")]
    pub metadata_timeout_seconds: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            group_id: default_group_id(),
            starting_offsets: StartingOffsets::default(),
            fail_on_data_loss: true,
            checkpoint_dir: default_checkpoint_dir(),
            id_strategy: IdStrategy::default(),
            dead_letter_topic: None,
            metadata_timeout_seconds: default_metadata_timeout(),
        }
    }
}

fn default_group_id() -> String {
    "userflow-sink".to_string()
}

fn default_true() -> bool {
    true
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from("/tmp/checkpoint")
}

fn default_metadata_timeout() -> u64 {
    10
}

// ============================================================================
// Storage
// ============================================================================

/// Column store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// DuckDB file, or `:memory:`
    #[serde(default = "default_storage_path")]
    pub path: String,

    /// Schema holding the table
    #[serde(default = "default_keyspace")]
    pub keyspace: String,

    /// Table name
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            keyspace: default_keyspace(),
            table: default_table(),
        }
    }
}

fn default_storage_path() -> String {
    "userflow.duckdb".to_string()
}

fn default_keyspace() -> String {
    "spark_streams".to_string()
}

fn default_table() -> String {
    "created_users".to_string()
}

// ============================================================================
// Schedule
// ============================================================================

/// Producer schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Workflow id
    #[serde(default = "default_dag_id")]
    pub dag_id: String,

    /// Task id
    #[serde(default = "default_task_id")]
    pub task_id: String,

    /// Cadence preset (`@hourly`, `@daily`, `@weekly`)
    #[serde(default)]
    pub interval: Cadence,

    /// Anchor of the tick grid
    #[serde(default = "default_start_date")]
    pub start_date: DateTime<Utc>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            dag_id: default_dag_id(),
            task_id: default_task_id(),
            interval: Cadence::default(),
            start_date: default_start_date(),
        }
    }
}

fn default_dag_id() -> String {
    DEFAULT_DAG_ID.to_string()
}

fn default_task_id() -> String {
    DEFAULT_TASK_ID.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = PipelineConfig::from_yaml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.source.url, "https://randomuser.me/api/");
        assert_eq!(config.broker.topic, "users_created");
        assert_eq!(config.broker.delivery, DeliveryMode::Confirm);
        assert_eq!(config.stream.starting_offsets, StartingOffsets::Earliest);
        assert!(config.stream.fail_on_data_loss);
        assert_eq!(config.stream.id_strategy, IdStrategy::Deterministic);
        assert_eq!(config.storage.keyspace, "spark_streams");
        assert_eq!(config.storage.table, "created_users");
        assert_eq!(config.schedule.dag_id, "user_automation");
        assert_eq!(config.schedule.interval, Cadence::Daily);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
broker:
  brokers: ["broker:29092"]
  delivery: fire_and_forget
stream:
  starting_offsets: latest
  fail_on_data_loss: false
  dead_letter_topic: users_created_dlq
storage:
  path: ":memory:"
schedule:
  interval: "@hourly"
  start_date: "2024-01-01T00:00:00Z"
"#;
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        config.validate().unwrap();

        assert_eq!(config.broker.brokers, vec!["broker:29092"]);
        assert_eq!(config.broker.topic, "users_created");
        assert_eq!(config.broker.delivery, DeliveryMode::FireAndForget);
        assert_eq!(config.stream.starting_offsets, StartingOffsets::Latest);
        assert!(!config.stream.fail_on_data_loss);
        assert_eq!(
            config.stream.dead_letter_topic.as_deref(),
            Some("users_created_dlq")
        );
        assert_eq!(config.storage.path, ":memory:");
        assert_eq!(config.schedule.interval, Cadence::Hourly);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = PipelineConfig::from_yaml("broker:\n  topics: [a]\n").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_SOURCE_URL, "http://localhost:8080/api/"),
            (ENV_BROKERS, "k1:9092, k2:9092,"),
            (ENV_STORAGE_PATH, ":memory:"),
            (ENV_CHECKPOINT_DIR, ""),
        ]
        .into_iter()
        .collect();

        let mut config = PipelineConfig::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.source.url, "http://localhost:8080/api/");
        assert_eq!(config.broker.brokers, vec!["k1:9092", "k2:9092"]);
        assert_eq!(config.storage.path, ":memory:");
        assert_eq!(config.stream.checkpoint_dir, PathBuf::from("/tmp/checkpoint"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PipelineConfig::default();
        config.source.url = "not a url".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            Error::InvalidConfigValue { ref field, .. } if field == "source.url"
        ));

        let mut config = PipelineConfig::default();
        config.source.url = "ftp://example.com/".to_string();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.broker.brokers.clear();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.stream.dead_letter_topic = Some("users_created".to_string());
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.storage.table = "created-users".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeouts() {
        let yaml = "stream:\n  metadata_timeout_seconds: 0\n";
        let config = PipelineConfig::from_yaml(yaml).unwrap();
        assert!(matches!(
            config.validate().unwrap_err(),
            Error::InvalidConfigValue { ref field, .. } if field == "stream.metadata_timeout_seconds"
        ));

        let mut config = PipelineConfig::default();
        config.source.timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.broker.confirm_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_derived_client_configs() {
        let mut config = PipelineConfig::default();
        config.broker.brokers = vec!["a:1".to_string(), "b:2".to_string()];
        config
            .broker
            .properties
            .insert("security.protocol".to_string(), "ssl".to_string());

        let producer = config.producer_config();
        assert_eq!(producer.brokers.len(), 2);
        assert_eq!(producer.confirm_timeout, Duration::from_secs(10));
        assert_eq!(producer.extra["security.protocol"], "ssl");

        let subscriber = config.subscriber_config();
        assert_eq!(subscriber.topic, "users_created");
        assert_eq!(subscriber.group_id, "userflow-sink");
        assert!(subscriber.fail_on_data_loss);

        let scheduler = config.scheduler();
        assert_eq!(scheduler.dag_id(), "user_automation");
        assert_eq!(scheduler.task_id(), "stream_data_from_api");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("userflow.yaml");
        std::fs::write(&path, "source:\n  timeout_seconds: 5\n").unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.source.timeout_seconds, 5);
        assert_eq!(config.http_config().timeout, Duration::from_secs(5));

        assert!(PipelineConfig::from_file(dir.path().join("missing.yaml")).is_err());
    }
}
