//! Pipeline types

use uuid::Uuid;

/// What happened to one consumed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Decoded and written under this id
    Persisted(Uuid),
    /// Rejected and sent to the error channel
    DeadLettered,
}

/// Running totals for a subscription
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionStats {
    /// Rows written to storage
    pub persisted: usize,
    /// Messages sent to the error channel
    pub dead_lettered: usize,
    /// Offset of the last message handled, if any
    pub last_offset: Option<i64>,
}

impl SubscriptionStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Total messages handled
    pub fn processed(&self) -> usize {
        self.persisted + self.dead_lettered
    }

    /// Count one handled message
    pub fn record(&mut self, offset: i64, outcome: MessageOutcome) {
        match outcome {
            MessageOutcome::Persisted(_) => self.persisted += 1,
            MessageOutcome::DeadLettered => self.dead_lettered += 1,
        }
        self.last_offset = Some(offset);
    }
}

