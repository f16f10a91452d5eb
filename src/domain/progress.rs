//! Checkpoint record for resumable bulk describe passes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resumable cursor over the object catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    /// Catalog index of the last fully processed object
    pub last_processed_index: usize,

    /// API name of that object
    pub last_processed_object: String,

    /// Size of the catalog for this pass
    pub total_objects: usize,

    /// When the pass started
    pub started_at: DateTime<Utc>,

    /// When this checkpoint was written
    pub last_updated_at: DateTime<Utc>,

    /// Catalog positions completed so far
    pub processed_count: usize,
}

impl ProgressState {
    /// Create a checkpoint for a pass that just started
    pub fn new(total_objects: usize) -> Self {
        let now = Utc::now();
        Self {
            last_processed_index: 0,
            last_processed_object: String::new(),
            total_objects,
            started_at: now,
            last_updated_at: now,
            processed_count: 0,
        }
    }

    /// Record that the object at `index` has been processed
    pub fn advance(&mut self, index: usize, object: impl Into<String>) {
        self.last_processed_index = index;
        self.last_processed_object = object.into();
        self.processed_count = index + 1;
        self.last_updated_at = Utc::now();
    }

    /// Catalog index where a resumed pass continues
    pub fn resume_index(&self) -> usize {
        self.last_processed_index + 1
    }
}
