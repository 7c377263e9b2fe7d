//! Staging worker
//!
//! Each worker pulls batches from the shared queue, stages them into a
//! private temporary table over a private connection, and reports either a
//! staging handle or a failure diagnostic through the result channels.

use crate::encode::encode_literal;
use std::sync::Arc;
use stageload_core::{
    Batch, BatchSnapshot, BulkConnection, BulkDriver, ColumnSpec, FailureReport, LoadError,
    Result, StagingHandle, Value,
};
use tokio::sync::{Mutex, mpsc};

/// Work queue shared across the pool. Fully seeded and closed before any
/// worker starts, so a pop either returns a batch or reports empty - it
/// never waits.
pub(crate) type BatchQueue = Arc<Mutex<mpsc::UnboundedReceiver<Batch>>>;

/// Immutable description of the staging job, one copy per worker
pub(crate) struct WorkerContext {
    pub id: usize,
    pub driver: Arc<dyn BulkDriver>,
    pub connection_string: String,
    /// Fully quoted destination name, e.g. `[dbo].[sales]`
    pub destination: String,
    /// Insertable columns in statement order
    pub columns: Arc<Vec<ColumnSpec>>,
    /// Disable strict truncation warnings at the session level
    pub suppress_truncation_warnings: bool,
}

impl WorkerContext {
    pub(crate) fn temp_table(&self) -> String {
        format!("#stage_{}", self.id)
    }

    pub(crate) fn column_list(&self) -> String {
        self.columns
            .iter()
            .map(|spec| spec.quoted_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub(crate) fn insert_header(&self) -> String {
        format!(
            "INSERT INTO {} ({}) VALUES\n",
            self.temp_table(),
            self.column_list()
        )
    }

    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|spec| spec.name.clone()).collect()
    }
}

/// Build one multi-row INSERT statement: header plus one literal tuple per
/// row.
pub(crate) fn build_insert(
    header: &str,
    columns: &[ColumnSpec],
    rows: &[Vec<Value>],
) -> Result<String> {
    let mut tuples = Vec::with_capacity(rows.len());
    for row in rows {
        let mut literals = Vec::with_capacity(columns.len());
        for (value, column) in row.iter().zip(columns.iter()) {
            literals.push(encode_literal(value, column)?);
        }
        tuples.push(format!("({})", literals.join(", ")));
    }
    Ok(format!("{}{}", header, tuples.join(",\n")))
}

/// Run one worker to completion, reporting through the result channels
pub(crate) async fn run_worker(
    ctx: WorkerContext,
    queue: BatchQueue,
    handles_tx: mpsc::UnboundedSender<StagingHandle>,
    failures_tx: mpsc::UnboundedSender<FailureReport>,
) {
    match stage_batches(&ctx, queue).await {
        Ok(handle) => {
            // Receiver outlives the workers; a send only fails if the load
            // was abandoned wholesale.
            let _ = handles_tx.send(handle);
        }
        Err(report) => {
            tracing::warn!(worker = ctx.id, error = %report.error, "staging worker failed");
            let _ = failures_tx.send(report);
        }
    }
}

async fn stage_batches(
    ctx: &WorkerContext,
    queue: BatchQueue,
) -> std::result::Result<StagingHandle, FailureReport> {
    let connection = open_staging_connection(ctx)
        .await
        .map_err(|(statement, error)| setup_failure(ctx, statement, error))?;

    let mut rows_staged = 0u64;
    loop {
        // The queue is closed and pre-populated; this resolves immediately.
        let batch = { queue.lock().await.recv().await };
        let Some(batch) = batch else { break };

        tracing::debug!(
            worker = ctx.id,
            start_row = batch.start_row,
            rows = batch.len(),
            "staging batch"
        );
        if let Err(report) = stage_one_batch(ctx, connection.as_ref(), &batch).await {
            let _ = connection.close().await;
            return Err(report);
        }
        rows_staged += batch.len() as u64;
    }

    Ok(StagingHandle {
        worker_id: ctx.id,
        connection,
        temp_table: ctx.temp_table(),
        rows_staged,
    })
}

/// Open the worker's private connection and create its staging table with
/// the destination's structure but no rows.
async fn open_staging_connection(
    ctx: &WorkerContext,
) -> std::result::Result<Arc<dyn BulkConnection>, (String, LoadError)> {
    let connection = ctx
        .driver
        .connect(&ctx.connection_string)
        .await
        .map_err(|error| ("<connect>".to_string(), error))?;

    if ctx.suppress_truncation_warnings {
        let statement = "SET ANSI_WARNINGS OFF";
        if let Err(error) = connection.execute(statement).await {
            let _ = connection.close().await;
            return Err((statement.to_string(), error));
        }
    }

    let create = format!(
        "SELECT {} INTO {} FROM {} WHERE 1 = 0",
        ctx.column_list(),
        ctx.temp_table(),
        ctx.destination
    );
    let created = async {
        connection.execute(&create).await?;
        connection.commit().await
    }
    .await;
    if let Err(error) = created {
        let _ = connection.close().await;
        return Err((create, error));
    }

    Ok(connection)
}

async fn stage_one_batch(
    ctx: &WorkerContext,
    connection: &dyn BulkConnection,
    batch: &Batch,
) -> std::result::Result<(), FailureReport> {
    let header = ctx.insert_header();
    let statement = match build_insert(&header, &ctx.columns, &batch.rows) {
        Ok(statement) => statement,
        Err(error) => return Err(bisect(ctx, connection, batch, error.to_string()).await),
    };

    if let Err(error) = connection.execute(&statement).await {
        return Err(bisect(ctx, connection, batch, error.to_string()).await);
    }
    if let Err(error) = connection.commit().await {
        return Err(failure_report(ctx, batch, error.to_string(), statement, None));
    }
    Ok(())
}

/// Row-level bisection: re-execute the same header with each row's tuple
/// individually until the first row that also fails, and package that row's
/// statement and index as the diagnostic. O(batch size) extra round trips,
/// on the failure path only. Nothing executed here is ever committed.
async fn bisect(
    ctx: &WorkerContext,
    connection: &dyn BulkConnection,
    batch: &Batch,
    batch_error: String,
) -> FailureReport {
    let header = ctx.insert_header();
    let mut last_statement = header.clone();
    for (offset, row) in batch.rows.iter().enumerate() {
        match build_insert(&header, &ctx.columns, std::slice::from_ref(row)) {
            Ok(statement) => {
                last_statement = statement;
                if let Err(error) = connection.execute(&last_statement).await {
                    return failure_report(
                        ctx,
                        batch,
                        error.to_string(),
                        last_statement,
                        Some(batch.start_row + offset),
                    );
                }
            }
            Err(error) => {
                return failure_report(
                    ctx,
                    batch,
                    error.to_string(),
                    last_statement,
                    Some(batch.start_row + offset),
                );
            }
        }
    }
    // No single row reproduces the failure; report the original batch error.
    failure_report(ctx, batch, batch_error, last_statement, None)
}

fn failure_report(
    ctx: &WorkerContext,
    batch: &Batch,
    error: String,
    statement: String,
    row_index: Option<usize>,
) -> FailureReport {
    FailureReport {
        worker_id: ctx.id,
        error,
        statement,
        row_index,
        batch: BatchSnapshot::capture(batch, &ctx.column_names()),
    }
}

/// Failure before any batch was attempted (connect or staging-table setup)
fn setup_failure(ctx: &WorkerContext, statement: String, error: LoadError) -> FailureReport {
    FailureReport {
        worker_id: ctx.id,
        error: error.to_string(),
        statement,
        row_index: None,
        batch: BatchSnapshot {
            columns: ctx.column_names(),
            ..BatchSnapshot::default()
        },
    }
}
