//! Pre-flight schema validation
//!
//! Runs to completion before any batch is dispatched: a validation failure
//! aborts the load with zero side effects on the destination.

use crate::encode::encoded_width;
use crate::options::LoadOptions;
use stageload_core::{Column, ColumnSpec, Frame, LoadError, Result, Value};

/// Check a frame against the destination's insertable columns and return
/// the normalized frame (absent columns synthesized as all-null when
/// allowed). Single pass, fail-fast.
pub fn validate(frame: &Frame, columns: &[ColumnSpec], options: &LoadOptions) -> Result<Frame> {
    let mut normalized = frame.clone();

    let missing: Vec<String> = columns
        .iter()
        .filter(|spec| normalized.column(&spec.name).is_none())
        .map(|spec| spec.name.clone())
        .collect();
    if !missing.is_empty() {
        if !options.allow_missing_columns {
            return Err(LoadError::MissingColumns { columns: missing });
        }
        let rows = normalized.row_count();
        for name in &missing {
            tracing::debug!(column = %name, "synthesizing absent column as all-null");
            normalized.push_column(Column::new(name, vec![Value::Null; rows]))?;
        }
    }

    for spec in columns.iter().filter(|spec| !spec.nullable) {
        if let Some(column) = normalized.column(&spec.name) {
            if column.values.iter().any(Value::is_null) {
                return Err(LoadError::NullValue {
                    column: spec.name.clone(),
                });
            }
        }
    }

    if !options.allow_truncation {
        for spec in columns {
            // varchar(max) and friends report -1; no limit to enforce.
            let Some(max) = spec.max_char_length.filter(|max| *max >= 0) else {
                continue;
            };
            let Some(column) = normalized.column(&spec.name) else {
                continue;
            };
            for value in &column.values {
                if let Some(width) = encoded_width(value, spec) {
                    if width as i64 > max {
                        return Err(LoadError::Truncation {
                            column: spec.name.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(normalized)
}
