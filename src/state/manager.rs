//! Checkpoint store implementation
//!
//! Provides file-based checkpoint persistence with atomic writes.

use super::types::CheckpointState;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// File name used inside a checkpoint directory
pub const CHECKPOINT_FILE: &str = "offsets.json";

/// Checkpoint store for persisting and loading subscription progress
#[derive(Debug)]
pub struct CheckpointStore {
    /// Path to the checkpoint file
    path: PathBuf,
    /// Current state (cached)
    state: Arc<RwLock<CheckpointState>>,
    /// Whether to save on every update
    auto_save: bool,
}

impl CheckpointStore {
    /// Create a store writing to the given file, starting empty
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Arc::new(RwLock::new(CheckpointState::new())),
            auto_save: true,
        }
    }

    /// Create a store with auto-save disabled
    pub fn without_auto_save(path: impl AsRef<Path>) -> Self {
        Self {
            auto_save: false,
            ..Self::new(path)
        }
    }

    /// Create an in-memory store (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(CheckpointState::new())),
            auto_save: false,
        }
    }

    /// Open a checkpoint file, loading existing state if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::checkpoint(format!("Failed to read checkpoint file: {e}")))?;
            serde_json::from_str(&contents)
                .map_err(|e| Error::checkpoint(format!("Failed to parse checkpoint file: {e}")))?
        } else {
            CheckpointState::new()
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(state)),
            auto_save: true,
        })
    }

    /// Open the checkpoint inside a checkpoint directory, creating the directory
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::checkpoint(format!(
                "Failed to create checkpoint directory {}: {e}",
                dir.display()
            ))
        })?;
        Self::from_file(dir.join(CHECKPOINT_FILE))
    }

    /// Save current state to file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = {
            let state = self.state.read().await;
            serde_json::to_string_pretty(&*state)
                .map_err(|e| Error::checkpoint(format!("Failed to serialize checkpoint: {e}")))?
        };

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::checkpoint(format!("Failed to write checkpoint file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::checkpoint(format!("Failed to rename checkpoint file: {e}")))?;

        Ok(())
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> CheckpointState {
        self.state.read().await.clone()
    }

    /// Next offset to read for a partition
    pub async fn get_offset(&self, topic: &str, partition: i32) -> Option<i64> {
        let state = self.state.read().await;
        state.get_offset(topic, partition)
    }

    /// Record the next offset to read for a partition
    pub async fn set_offset(&self, topic: &str, partition: i32, next_offset: i64) -> Result<()> {
        let advanced = {
            let mut state = self.state.write().await;
            state.set_offset(topic, partition, next_offset)
        };

        if advanced && self.auto_save {
            self.save().await?;
        }

        Ok(())
    }

    /// Clear all progress
    pub async fn clear(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            *state = CheckpointState::new();
        }

        if self.auto_save {
            self.save().await?;
        }

        Ok(())
    }

    /// Get the checkpoint file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    /// Persist now (alias for save)
    pub async fn checkpoint(&self) -> Result<()> {
        self.save().await
    }
}

impl Clone for CheckpointStore {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            state: Arc::clone(&self.state),
            auto_save: self.auto_save,
        }
    }
}
