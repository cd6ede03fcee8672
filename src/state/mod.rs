//! Checkpoint module
//!
//! Tracks how far the subscription has persisted, per topic partition,
//! so a restart resumes without reprocessing stored rows.
//!
//! # Overview
//!
//! The checkpoint module provides:
//! - `CheckpointState` - next offset to read per topic partition
//! - `CheckpointStore` - file-based persistence with atomic writes

mod manager;
mod types;

pub use manager::{CheckpointStore, CHECKPOINT_FILE};
pub use types::{CheckpointState, TopicCheckpoint};
