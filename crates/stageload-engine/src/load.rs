//! Load orchestrator
//!
//! Owns the end-to-end flow: validate, chunk, run the worker pool, then
//! merge every staged table into the destination - or abort with a
//! composite error and on-disk diagnostics if any worker failed.

use crate::artifacts;
use crate::chunk::{chunk, effective_worker_count};
use crate::options::LoadOptions;
use crate::validate::validate;
use crate::worker::{WorkerContext, run_worker};
use std::sync::Arc;
use stageload_core::{
    BatchSnapshot, BulkConnection, BulkDriver, ColumnSpec, FailureReport, Frame, LoadError,
    LoadReport, Result, StagingHandle, insertable_columns,
};
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

/// Bulk-load a frame into `schema.table` over `connection_string`.
///
/// The destination is touched exactly once, at the very end, and only if
/// every staging worker succeeded. Any failure surfaces a single aggregate
/// error enumerating every independent cause - never a partial-success
/// state.
pub async fn load(
    frame: &Frame,
    table: &str,
    connection_string: &str,
    driver: Arc<dyn BulkDriver>,
    options: &LoadOptions,
) -> Result<LoadReport> {
    let load_id = Uuid::new_v4();

    if options.chunk_size == 0 {
        return Err(LoadError::Configuration(
            "chunk_size must be at least 1".to_string(),
        ));
    }
    if options.worker_count == 0 {
        return Err(LoadError::Configuration(
            "worker_count must be at least 1".to_string(),
        ));
    }
    if frame.row_count() == 0 {
        tracing::warn!(table = %table, "input frame has no rows; nothing to load");
        return Ok(LoadReport::empty(load_id));
    }

    let destination = destination_name(table, &options.schema_name);

    // Validating: describe the destination and check the input before any
    // staging connection is opened or batch dispatched.
    let control = driver.connect(connection_string).await?;
    let prepared = prepare(frame, table, control.as_ref(), options).await;
    let _ = control.close().await;
    let (normalized, columns) = prepared?;

    // Chunking
    let batches = chunk(&normalized, &columns, options.chunk_size)?;
    let batch_count = batches.len();
    let worker_count = effective_worker_count(options.worker_count, batch_count);
    tracing::debug!(
        load_id = %load_id,
        rows = normalized.row_count(),
        batch_count,
        worker_count,
        "dispatching staged load"
    );

    // Seed and close the queue before any worker starts; pops never block.
    let (batch_tx, batch_rx) = mpsc::unbounded_channel();
    for batch in batches {
        let _ = batch_tx.send(batch);
    }
    drop(batch_tx);
    let queue = Arc::new(Mutex::new(batch_rx));

    let (handles_tx, mut handles_rx) = mpsc::unbounded_channel();
    let (failures_tx, mut failures_rx) = mpsc::unbounded_channel();
    let columns = Arc::new(columns);

    // Staging
    let mut workers = Vec::with_capacity(worker_count);
    for id in 0..worker_count {
        let ctx = WorkerContext {
            id,
            driver: driver.clone(),
            connection_string: connection_string.to_string(),
            destination: destination.clone(),
            columns: columns.clone(),
            suppress_truncation_warnings: options.allow_truncation,
        };
        workers.push(tokio::spawn(run_worker(
            ctx,
            queue.clone(),
            handles_tx.clone(),
            failures_tx.clone(),
        )));
    }
    drop(handles_tx);
    drop(failures_tx);

    // Join barrier: the orchestrator's only blocking point. A worker
    // failure never interrupts its siblings.
    let mut failures: Vec<FailureReport> = Vec::new();
    for (id, worker) in workers.into_iter().enumerate() {
        if let Err(join_error) = worker.await {
            tracing::error!(worker = id, error = %join_error, "staging worker panicked");
            failures.push(FailureReport {
                worker_id: id,
                error: format!("worker task terminated abnormally: {}", join_error),
                statement: String::new(),
                row_index: None,
                batch: BatchSnapshot::default(),
            });
        }
    }

    let mut handles: Vec<StagingHandle> = Vec::new();
    while let Some(handle) = handles_rx.recv().await {
        handles.push(handle);
    }
    while let Some(failure) = failures_rx.recv().await {
        failures.push(failure);
    }

    if !failures.is_empty() {
        return Err(abort(load_id, handles, failures, options).await);
    }

    // Merging
    let column_list = columns
        .iter()
        .map(|spec| spec.quoted_name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let rows_loaded = merge(&destination, &column_list, handles, options).await?;

    tracing::debug!(load_id = %load_id, rows_loaded, "load complete");
    Ok(LoadReport {
        load_id,
        rows_loaded,
        batch_count,
        worker_count,
    })
}

/// Describe the destination, normalize the index, and validate the input
async fn prepare(
    frame: &Frame,
    table: &str,
    control: &dyn BulkConnection,
    options: &LoadOptions,
) -> Result<(Frame, Vec<ColumnSpec>)> {
    let schema_source = control.as_schema_source().ok_or_else(|| {
        LoadError::Schema(format!(
            "Driver '{}' does not support table description",
            control.driver_name()
        ))
    })?;
    let table_name = trim_brackets(table);
    let specs = schema_source
        .describe_table(&table_name, &options.schema_name)
        .await?;
    if specs.is_empty() {
        return Err(LoadError::Schema(format!(
            "Table '{}.{}' not found or has no columns",
            options.schema_name, table_name
        )));
    }
    let columns = insertable_columns(&specs);
    if columns.is_empty() {
        return Err(LoadError::Schema(format!(
            "Table '{}.{}' has no insertable columns",
            options.schema_name, table_name
        )));
    }

    let mut input = frame.clone();
    if options.include_index {
        input.promote_index()?;
    } else {
        input.drop_index();
    }

    let normalized = validate(&input, &columns, options)?;
    Ok((normalized, columns))
}

/// Abort path: close surviving connections, persist diagnostics, build the
/// composite error. The destination table is never touched.
async fn abort(
    load_id: Uuid,
    handles: Vec<StagingHandle>,
    mut failures: Vec<FailureReport>,
    options: &LoadOptions,
) -> LoadError {
    for handle in handles {
        let _ = handle.connection.close().await;
    }
    failures.sort_by_key(|failure| failure.worker_id);

    let root = options
        .artifact_root
        .clone()
        .unwrap_or_else(artifacts::default_artifact_root);
    match artifacts::persist_failures(&root, load_id, &failures) {
        Ok(dir) => tracing::error!(
            load_id = %load_id,
            path = %dir.display(),
            "staging failed; diagnostics persisted for offline inspection"
        ),
        Err(error) => tracing::warn!(
            load_id = %load_id,
            error = %error,
            "staging failed and diagnostics could not be persisted"
        ),
    }

    LoadError::Staging { failures }
}

/// Merge phase: runs only when zero workers failed. Each staged table is
/// merged on its own connection (the staging table is session-scoped),
/// sequentially; the destination is touched by this function alone.
async fn merge(
    destination: &str,
    column_list: &str,
    handles: Vec<StagingHandle>,
    options: &LoadOptions,
) -> Result<u64> {
    // Deferred until staging is known good, so a failed load never leaves
    // the destination empty.
    if options.replace_existing {
        if let Some(first) = handles.first() {
            let delete = format!("DELETE FROM {}", destination);
            if let Err(error) = run_on(first.connection.as_ref(), &delete).await {
                close_all(&handles).await;
                return Err(error);
            }
        }
    }

    let mut rows_loaded = 0u64;
    let mut remaining = handles.into_iter();
    while let Some(handle) = remaining.next() {
        let merged = merge_one(destination, column_list, &handle).await;
        let _ = handle.connection.close().await;
        match merged {
            Ok(merged) => {
                if merged != handle.rows_staged {
                    tracing::warn!(
                        worker = handle.worker_id,
                        staged = handle.rows_staged,
                        merged,
                        "merged row count differs from staged count"
                    );
                }
                rows_loaded += merged;
            }
            Err(error) => {
                let rest: Vec<StagingHandle> = remaining.collect();
                close_all(&rest).await;
                return Err(error);
            }
        }
    }
    Ok(rows_loaded)
}

async fn merge_one(
    destination: &str,
    column_list: &str,
    handle: &StagingHandle,
) -> Result<u64> {
    let connection = handle.connection.as_ref();
    let merged = connection
        .execute(&format!(
            "INSERT INTO {} ({}) SELECT {} FROM {}",
            destination, column_list, column_list, handle.temp_table
        ))
        .await?;
    connection
        .execute(&format!("DROP TABLE {}", handle.temp_table))
        .await?;
    connection.commit().await?;
    tracing::debug!(worker = handle.worker_id, merged, "merged staging table");
    Ok(merged)
}

async fn run_on(connection: &dyn BulkConnection, sql: &str) -> Result<()> {
    connection.execute(sql).await?;
    connection.commit().await
}

async fn close_all(handles: &[StagingHandle]) {
    for handle in handles {
        let _ = handle.connection.close().await;
    }
}

fn destination_name(table: &str, schema: &str) -> String {
    format!("[{}].[{}]", trim_brackets(schema), trim_brackets(table))
}

fn trim_brackets(name: &str) -> String {
    name.replace(['[', ']'], "")
}
