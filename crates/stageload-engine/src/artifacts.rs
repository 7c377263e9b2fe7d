//! Failure artifact persistence
//!
//! Layout: one directory per load attempt, one subdirectory per failing
//! worker, each holding the offending statement text and a JSON snapshot of
//! the worker's batch for offline replay.

use stageload_core::{FailureReport, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Default artifact location: the platform-local data directory, falling
/// back to the temp directory.
pub fn default_artifact_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("stageload")
        .join("failures")
}

pub(crate) fn persist_failures(
    root: &Path,
    load_id: Uuid,
    failures: &[FailureReport],
) -> Result<PathBuf> {
    let attempt_dir = root.join(format!("load-{}", load_id));
    for failure in failures {
        let worker_dir = attempt_dir.join(format!("worker-{}", failure.worker_id));
        fs::create_dir_all(&worker_dir)?;
        fs::write(worker_dir.join("statement.sql"), &failure.statement)?;
        let snapshot = serde_json::to_string_pretty(&failure.batch)?;
        fs::write(worker_dir.join("batch.json"), snapshot)?;
    }
    Ok(attempt_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stageload_core::{BatchSnapshot, Value};

    fn sample_failure(worker_id: usize) -> FailureReport {
        FailureReport {
            worker_id,
            error: "Driver error: string or binary data would be truncated".into(),
            statement: "INSERT INTO #stage_0 ([name]) VALUES\n('x')".into(),
            row_index: Some(7),
            batch: BatchSnapshot {
                columns: vec!["name".into()],
                start_row: 0,
                rows: vec![vec![Value::String("x".into())]],
            },
        }
    }

    #[test]
    fn test_persist_layout() {
        let dir = tempfile::tempdir().unwrap();
        let load_id = Uuid::new_v4();
        let failures = vec![sample_failure(0), sample_failure(3)];

        let attempt = persist_failures(dir.path(), load_id, &failures).unwrap();
        assert_eq!(attempt, dir.path().join(format!("load-{}", load_id)));
        for worker in [0, 3] {
            let worker_dir = attempt.join(format!("worker-{}", worker));
            assert!(worker_dir.join("statement.sql").is_file());
            assert!(worker_dir.join("batch.json").is_file());
        }

        let snapshot: BatchSnapshot = serde_json::from_str(
            &fs::read_to_string(attempt.join("worker-0").join("batch.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(snapshot.columns, vec!["name".to_string()]);
        assert_eq!(snapshot.rows.len(), 1);
    }

    #[test]
    fn test_statement_text_preserved_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let load_id = Uuid::new_v4();
        let failure = sample_failure(1);

        let attempt = persist_failures(dir.path(), load_id, std::slice::from_ref(&failure)).unwrap();
        let text = fs::read_to_string(attempt.join("worker-1").join("statement.sql")).unwrap();
        assert_eq!(text, failure.statement);
    }
}
