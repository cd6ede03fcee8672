//! Common types used throughout userflow
//!
//! Shared enums that appear both in configuration and in the
//! components that act on them.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

// ============================================================================
// Starting Offsets
// ============================================================================

/// Where a subscription starts reading when no checkpoint exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartingOffsets {
    /// Oldest retained message
    #[default]
    Earliest,
    /// Only messages produced after subscribing
    Latest,
}

impl StartingOffsets {
    /// Value for the `auto.offset.reset` broker client setting
    pub fn as_str(self) -> &'static str {
        match self {
            StartingOffsets::Earliest => "earliest",
            StartingOffsets::Latest => "latest",
        }
    }
}

impl fmt::Display for StartingOffsets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Delivery Mode
// ============================================================================

/// How the publisher treats broker acknowledgments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Enqueue and return without waiting; a crash right after may lose the message
    FireAndForget,
    /// Wait for the broker acknowledgment before returning
    #[default]
    Confirm,
}

// ============================================================================
// Id Strategy
// ============================================================================

/// How a decoded record gets its primary key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// UUIDv5 over the record's natural key; replays upsert the same row
    #[default]
    Deterministic,
    /// Fresh UUIDv4 on every decode; replays create new rows
    Random,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_offsets_serde() {
        let offsets: StartingOffsets = serde_json::from_str("\"latest\"").unwrap();
        assert_eq!(offsets, StartingOffsets::Latest);
        assert_eq!(StartingOffsets::default().as_str(), "earliest");
    }

    #[test]
    fn test_delivery_mode_serde() {
        let mode: DeliveryMode = serde_json::from_str("\"fire_and_forget\"").unwrap();
        assert_eq!(mode, DeliveryMode::FireAndForget);
        assert_eq!(DeliveryMode::default(), DeliveryMode::Confirm);
    }

    #[test]
    fn test_id_strategy_default() {
        assert_eq!(IdStrategy::default(), IdStrategy::Deterministic);
        let strategy: IdStrategy = serde_json::from_str("\"random\"").unwrap();
        assert_eq!(strategy, IdStrategy::Random);
    }
}
