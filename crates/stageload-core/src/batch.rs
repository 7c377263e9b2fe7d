//! Batch, staging and result types flowing between the workers and the
//! orchestrator

use crate::{BulkConnection, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// A contiguous row range of a frame, materialized in insertable-column
/// order. Owned by exactly one staging worker at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Absolute offset of the first row within the source frame
    pub start_row: usize,
    /// Rows in insertable-column order
    pub rows: Vec<Vec<Value>>,
}

impl Batch {
    /// Number of rows in the batch
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A serializable copy of a batch, persisted with failure artifacts for
/// offline replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSnapshot {
    /// Insertable column names, in statement order
    pub columns: Vec<String>,
    /// Absolute offset of the first row within the source frame
    pub start_row: usize,
    /// The batch's rows
    pub rows: Vec<Vec<Value>>,
}

impl BatchSnapshot {
    /// Snapshot a batch together with its column names
    pub fn capture(batch: &Batch, columns: &[String]) -> Self {
        Self {
            columns: columns.to_vec(),
            start_row: batch.start_row,
            rows: batch.rows.clone(),
        }
    }
}

/// A private, staged-but-unmerged temporary table.
///
/// Produced only by a worker whose entire queue share drained without error;
/// the connection stays open until the merge phase consumes the handle.
pub struct StagingHandle {
    /// Worker that staged the rows
    pub worker_id: usize,
    /// The worker's private connection (the temp table is session-scoped)
    pub connection: Arc<dyn BulkConnection>,
    /// Name of the private staging table
    pub temp_table: String,
    /// Rows staged across all of the worker's batches
    pub rows_staged: u64,
}

impl std::fmt::Debug for StagingHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagingHandle")
            .field("worker_id", &self.worker_id)
            .field("temp_table", &self.temp_table)
            .field("rows_staged", &self.rows_staged)
            .finish()
    }
}

/// Self-contained diagnostic bundle for one worker's unrecoverable failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    /// Worker that failed
    pub worker_id: usize,
    /// Stringified driver or encoding error
    pub error: String,
    /// The last attempted statement text
    pub statement: String,
    /// Absolute source row index isolated by bisection, when known
    pub row_index: Option<usize>,
    /// The offending batch's data
    pub batch: BatchSnapshot,
}

/// Summary returned by a successful load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadReport {
    /// Unique identifier of this load attempt
    pub load_id: Uuid,
    /// Rows merged into the destination
    pub rows_loaded: u64,
    /// Number of batches staged
    pub batch_count: usize,
    /// Number of workers actually spawned
    pub worker_count: usize,
}

impl LoadReport {
    /// Report for the documented zero-row no-op
    pub fn empty(load_id: Uuid) -> Self {
        Self {
            load_id,
            rows_loaded: 0,
            batch_count: 0,
            worker_count: 0,
        }
    }
}
