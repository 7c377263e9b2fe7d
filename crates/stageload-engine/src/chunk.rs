//! Batch partitioning

use stageload_core::{Batch, ColumnSpec, Frame, LoadError, Result};

/// Partition a normalized frame into fixed-size row batches in
/// insertable-column order. Deterministic; covers every row exactly once;
/// the last batch may be smaller.
pub fn chunk(frame: &Frame, columns: &[ColumnSpec], chunk_size: usize) -> Result<Vec<Batch>> {
    if chunk_size == 0 {
        return Err(LoadError::Configuration(
            "chunk_size must be at least 1".to_string(),
        ));
    }

    let mut positions = Vec::with_capacity(columns.len());
    for spec in columns {
        let position = frame.column_index(&spec.name).ok_or_else(|| {
            LoadError::Frame(format!(
                "Column '{}' missing from normalized frame",
                spec.name
            ))
        })?;
        positions.push(position);
    }

    let rows = frame.row_count();
    let frame_columns = frame.columns();
    let mut batches = Vec::with_capacity(rows.div_ceil(chunk_size));
    let mut start = 0;
    while start < rows {
        let end = (start + chunk_size).min(rows);
        let mut batch_rows = Vec::with_capacity(end - start);
        for row in start..end {
            batch_rows.push(
                positions
                    .iter()
                    .map(|&column| frame_columns[column].values[row].clone())
                    .collect(),
            );
        }
        batches.push(Batch {
            start_row: start,
            rows: batch_rows,
        });
        start = end;
    }
    Ok(batches)
}

/// Never spawn more workers than there is work, and never zero for a
/// non-empty table.
pub fn effective_worker_count(configured: usize, chunk_count: usize) -> usize {
    configured.max(1).min(chunk_count)
}
