//! Checkpoint persistence for resumable bulk passes.
//!
//! A single JSON record is overwritten at a well-known location. There is no
//! history: the checkpoint only answers "where do I continue?".

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, warn};

use crate::config::paths;
use crate::domain::ProgressState;

/// File-backed progress tracker
pub struct ProgressTracker {
    path: PathBuf,
}

impl ProgressTracker {
    /// Create a tracker for an explicit checkpoint path
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Tracker for the checkpoint under an output root
    pub fn for_root(root: &Path) -> Self {
        Self::new(paths::progress_file(root))
    }

    /// Get the checkpoint path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the checkpoint
    pub async fn save(&self, state: &ProgressState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(state)?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write checkpoint: {}", self.path.display()))?;

        debug!(
            index = state.last_processed_index,
            object = %state.last_processed_object,
            "Checkpoint saved"
        );
        Ok(())
    }

    /// Load the checkpoint; absence and corruption both mean "no progress"
    pub async fn load(&self) -> Option<ProgressState> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read checkpoint, starting fresh");
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt checkpoint, starting fresh");
                None
            }
        }
    }

    /// Remove the checkpoint; a no-op when none exists
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Checkpoint cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove checkpoint: {}", self.path.display())),
        }
    }
}
