//! CLI runner - executes commands

use crate::broker::{
    DeadLetterSink, KafkaProducer, KafkaSubscriber, LogDeadLetters, Publisher, TopicDeadLetters,
};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::PipelineConfig;
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClient;
use crate::pipeline::{produce_once, Subscription};
use crate::record::{normalize, IdAssigner, RawUserRecord};
use crate::sink::{DuckDbSink, RowSink};
use crate::source::{first_result, RandomUserSource};
use crate::state::CheckpointStore;
use serde_json::{json, Value};
use std::io::Read as _;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Produce => self.produce().await,
            Commands::Schedule => self.schedule().await,
            Commands::Consume { checkpoint_dir } => self.consume(checkpoint_dir.as_deref()).await,
            Commands::InitSchema => self.init_schema().await,
            Commands::Normalize { input } => self.normalize(input.as_deref()),
            Commands::Rows { limit } => self.rows(*limit).await,
            Commands::Validate => self.validate(),
        }
    }

    /// Load, override and validate configuration
    fn load_config(&self) -> Result<PipelineConfig> {
        PipelineConfig::load(self.cli.config.as_deref())
    }

    fn build_source(&self, config: &PipelineConfig) -> Result<RandomUserSource> {
        let client = HttpClient::with_config(config.http_config())?;
        Ok(RandomUserSource::new(client, config.source.url.clone()))
    }

    fn build_publisher(&self, config: &PipelineConfig) -> Result<Publisher> {
        let producer = KafkaProducer::new(&config.producer_config())?;
        Ok(Publisher::new(Arc::new(producer), config.broker.topic.clone()))
    }

    fn open_sink(&self, config: &PipelineConfig) -> Result<DuckDbSink> {
        DuckDbSink::open(
            &config.storage.path,
            &config.storage.keyspace,
            &config.storage.table,
        )
    }

    /// One producer tick
    async fn produce(&self) -> Result<()> {
        let config = self.load_config()?;
        let source = self.build_source(&config)?;
        let publisher = self.build_publisher(&config)?;

        let record = produce_once(&source, &publisher).await?;
        publisher.flush().await?;

        self.output_message(&json!({
            "type": "RECORD",
            "topic": publisher.topic(),
            "record": record,
        }));
        Ok(())
    }

    /// Producer ticks until Ctrl-C
    async fn schedule(&self) -> Result<()> {
        let config = self.load_config()?;
        let source = self.build_source(&config)?;
        let publisher = self.build_publisher(&config)?;
        let scheduler = config.scheduler();

        let (source, publisher_ref) = (&source, &publisher);
        let runs = scheduler
            .run_until(move || produce_once(source, publisher_ref), shutdown_signal())
            .await?;
        publisher.flush().await?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Scheduler '{}' stopped after {runs} runs",
                    scheduler.dag_id()
                ),
            }
        }));
        Ok(())
    }

    /// Subscription until Ctrl-C
    async fn consume(&self, checkpoint_dir: Option<&Path>) -> Result<()> {
        let mut config = self.load_config()?;
        if let Some(dir) = checkpoint_dir {
            config.stream.checkpoint_dir = dir.to_path_buf();
            config.validate()?;
        }

        let sink = Arc::new(self.open_sink(&config)?);
        sink.ensure_schema().await?;

        let checkpoint = CheckpointStore::open_dir(&config.stream.checkpoint_dir)?;
        info!(path = %checkpoint.path().display(), "Checkpoint loaded");

        let subscriber =
            KafkaSubscriber::connect(&config.subscriber_config(), &checkpoint.snapshot().await)?;

        let dead_letters = dead_letter_sink(&config)?;

        let mut subscription = Subscription::new(
            subscriber,
            sink,
            checkpoint,
            IdAssigner::new(config.stream.id_strategy),
            dead_letters,
        );
        let stats = subscription.run_until(shutdown_signal()).await?;

        self.output_message(&json!({
            "type": "STATS",
            "stats": {
                "persisted": stats.persisted,
                "dead_lettered": stats.dead_lettered,
                "last_offset": stats.last_offset,
            }
        }));
        Ok(())
    }

    /// Create keyspace and table
    async fn init_schema(&self) -> Result<()> {
        let config = self.load_config()?;
        let sink = self.open_sink(&config)?;
        sink.ensure_schema().await?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!("Table {} ready at {}", sink.qualified_table(), sink.location()),
            }
        }));
        Ok(())
    }

    /// Normalize a raw record from a file or stdin
    fn normalize(&self, input: Option<&Path>) -> Result<()> {
        let content = match input {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                Error::config(format!("Failed to read input '{}': {e}", path.display()))
            })?,
            None => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("Failed to read stdin")?;
                buf
            }
        };

        let value: Value =
            serde_json::from_str(&content).context("Input is not a JSON document")?;
        let raw = if value.get("results").is_some() {
            first_result(value)?
        } else {
            RawUserRecord::new(value)
        };

        let record = normalize(&raw)?;
        self.output_message(&serde_json::to_value(&record)?);
        Ok(())
    }

    /// Print stored rows
    async fn rows(&self, limit: usize) -> Result<()> {
        let config = self.load_config()?;
        let sink = self.open_sink(&config)?;
        sink.ensure_schema().await?;

        let total = sink.row_count()?;
        for row in sink.list_rows(limit)? {
            self.output_message(&json!({"type": "ROW", "row": row}));
        }

        if total > limit {
            warn!(total, limit, "Output truncated");
        }
        Ok(())
    }

    /// Print the effective configuration
    fn validate(&self) -> Result<()> {
        let config = self.load_config()?;
        self.output_message(&json!({
            "type": "CONFIG",
            "config": config,
        }));
        Ok(())
    }

    /// Write one message to stdout
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Dead-letter destination for the consumer
///
/// Without a dead-letter topic, rejected messages (including rows whose write
/// failed) are only logged and the checkpoint still moves past them.
fn dead_letter_sink(config: &PipelineConfig) -> Result<Arc<dyn DeadLetterSink>> {
    match &config.stream.dead_letter_topic {
        Some(topic) => {
            let producer = KafkaProducer::new(&config.producer_config())?;
            info!(topic = %topic, "Rejected messages go to dead-letter topic");
            Ok(Arc::new(TopicDeadLetters::new(Arc::new(producer), topic.clone())))
        }
        None => {
            warn!(
                "No stream.dead_letter_topic configured; rejected messages and failed \
                 writes are logged and skipped"
            );
            Ok(Arc::new(LogDeadLetters))
        }
    }
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
