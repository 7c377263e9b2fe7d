//! Error types for stageload

use crate::FailureReport;
use thiserror::Error;

/// Core error type for load operations
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Destination columns missing from input: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("Null value in non-nullable column '{column}'")]
    NullValue { column: String },

    #[error("Encoded value exceeds maximum character length of column '{column}'")]
    Truncation { column: String },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Frame error: {0}")]
    Frame(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("{}", format_staging_failures(.failures))]
    Staging { failures: Vec<FailureReport> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One line per failing worker so the composite error enumerates every
/// independent cause.
fn format_staging_failures(failures: &[FailureReport]) -> String {
    let mut out = format!("Staging failed on {} worker(s):", failures.len());
    for failure in failures {
        out.push_str(&format!(
            "\n  worker {}: {}{}",
            failure.worker_id,
            failure.error,
            match failure.row_index {
                Some(row) => format!(" (row {})", row),
                None => String::new(),
            }
        ));
    }
    out
}

/// Result type alias for load operations
pub type Result<T> = std::result::Result<T, LoadError>;
