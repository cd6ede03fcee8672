//! Subscription loop: consume, decode, persist, checkpoint

use super::types::{MessageOutcome, SubscriptionStats};
use crate::broker::{DeadLetter, DeadLetterSink, MessageSource, TopicMessage};
use crate::error::{Error, Result};
use crate::record::{decode_row, IdAssigner};
use crate::sink::RowSink;
use crate::state::CheckpointStore;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Long-running consumer feeding the row sink
pub struct Subscription<S> {
    source: S,
    sink: Arc<dyn RowSink>,
    checkpoint: CheckpointStore,
    ids: IdAssigner,
    dead_letters: Arc<dyn DeadLetterSink>,
    stats: SubscriptionStats,
}

impl<S: MessageSource> Subscription<S> {
    /// Create a subscription over a message source
    pub fn new(
        source: S,
        sink: Arc<dyn RowSink>,
        checkpoint: CheckpointStore,
        ids: IdAssigner,
        dead_letters: Arc<dyn DeadLetterSink>,
    ) -> Self {
        Self {
            source,
            sink,
            checkpoint,
            ids,
            dead_letters,
            stats: SubscriptionStats::new(),
        }
    }

    /// Get statistics
    pub fn stats(&self) -> &SubscriptionStats {
        &self.stats
    }

    /// Get the checkpoint store
    pub fn checkpoint(&self) -> &CheckpointStore {
        &self.checkpoint
    }

    /// Handle one message and advance the checkpoint past it
    ///
    /// Decode and write failures are dead-lettered and do not fail the call.
    /// Dead-letter and checkpoint failures do.
    pub async fn process(&mut self, message: TopicMessage) -> Result<MessageOutcome> {
        let outcome = match self.persist(&message).await {
            Ok(id) => {
                debug!(
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    %id,
                    "Row persisted"
                );
                MessageOutcome::Persisted(id)
            }
            Err(e) => {
                if !e.is_invalid_data() {
                    warn!(
                        topic = %message.topic,
                        partition = message.partition,
                        offset = message.offset,
                        error_type = e.kind(),
                        "Row could not be written: {e}"
                    );
                }
                self.dead_letters.send(DeadLetter::new(&message, &e)).await?;
                MessageOutcome::DeadLettered
            }
        };

        self.checkpoint
            .set_offset(&message.topic, message.partition, message.next_offset())
            .await?;
        self.stats.record(message.offset, outcome);

        Ok(outcome)
    }

    async fn persist(&self, message: &TopicMessage) -> Result<uuid::Uuid> {
        let payload = message
            .payload
            .as_deref()
            .ok_or_else(|| Error::schema_mismatch("message has no payload"))?;
        let row = decode_row(payload, &self.ids)?;
        self.sink.write_row(&row).await?;
        Ok(row.id)
    }

    /// Consume until the source is exhausted or `shutdown` resolves
    ///
    /// A message already being handled when shutdown fires is finished
    /// first. The checkpoint is saved before returning.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<SubscriptionStats>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("Subscription started");

        loop {
            let next = tokio::select! {
                biased;
                () = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                next = self.source.next_message() => next?,
            };

            let Some(message) = next else {
                info!("Message source exhausted");
                break;
            };
            self.process(message).await?;
        }

        self.checkpoint.checkpoint().await?;
        info!(
            persisted = self.stats.persisted,
            dead_lettered = self.stats.dead_lettered,
            "Subscription stopped"
        );
        Ok(self.stats.clone())
    }

    /// Consume until the source is exhausted
    pub async fn run(&mut self) -> Result<SubscriptionStats> {
        self.run_until(std::future::pending()).await
    }
}

impl<S> std::fmt::Debug for Subscription<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("ids", &self.ids)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
