//! Load configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration options for one load operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadOptions {
    /// Destination schema name
    pub schema_name: String,
    /// Promote the frame's index to a regular column (a positional `index`
    /// column is synthesized when the frame carries none)
    pub include_index: bool,
    /// Delete all destination rows before merging. The delete is deferred
    /// until staging has fully succeeded, so a failed load never leaves the
    /// destination empty.
    pub replace_existing: bool,
    /// Rows per batch
    pub chunk_size: usize,
    /// Upper bound on the worker pool; the effective count never exceeds
    /// the batch count
    pub worker_count: usize,
    /// Skip the pre-flight truncation check and disable strict truncation
    /// warnings at the session level
    pub allow_truncation: bool,
    /// Synthesize absent destination columns as all-null instead of failing
    pub allow_missing_columns: bool,
    /// Where failure artifacts are persisted (platform data dir when unset)
    pub artifact_root: Option<PathBuf>,
}

impl LoadOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the destination schema name
    pub fn with_schema_name(mut self, schema: &str) -> Self {
        self.schema_name = schema.to_string();
        self
    }

    /// Promote the frame's index to a regular column
    pub fn with_include_index(mut self, include: bool) -> Self {
        self.include_index = include;
        self
    }

    /// Replace the destination's rows instead of appending
    pub fn with_replace_existing(mut self, replace: bool) -> Self {
        self.replace_existing = replace;
        self
    }

    /// Set the rows-per-batch chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the worker pool bound
    pub fn with_worker_count(mut self, workers: usize) -> Self {
        self.worker_count = workers;
        self
    }

    /// Allow values longer than the destination column's character limit
    pub fn with_allow_truncation(mut self, allow: bool) -> Self {
        self.allow_truncation = allow;
        self
    }

    /// Allow destination columns absent from the input
    pub fn with_allow_missing_columns(mut self, allow: bool) -> Self {
        self.allow_missing_columns = allow;
        self
    }

    /// Set the failure-artifact root directory
    pub fn with_artifact_root(mut self, root: PathBuf) -> Self {
        self.artifact_root = Some(root);
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            schema_name: "dbo".to_string(),
            include_index: false,
            replace_existing: false,
            chunk_size: 1000,
            worker_count: 5,
            allow_truncation: false,
            allow_missing_columns: false,
            artifact_root: None,
        }
    }
}
