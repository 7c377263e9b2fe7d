//! Tests for MS SQL Server connection module

use crate::connection::{COMMIT_GUARD, MssqlConnectionError};
use stageload_core::LoadError;

#[test]
fn test_commit_is_guarded_by_transaction_count() {
    assert!(COMMIT_GUARD.contains("@@TRANCOUNT"));
    assert!(COMMIT_GUARD.contains("COMMIT TRANSACTION"));
}

#[test]
fn test_connection_error_converts_to_driver_error() {
    let err: LoadError = MssqlConnectionError::ConnectionClosed.into();
    match err {
        LoadError::Driver(message) => assert!(message.contains("closed")),
        other => panic!("expected Driver error, got {other:?}"),
    }
}

#[test]
fn test_execution_error_display_carries_detail() {
    let err = MssqlConnectionError::ExecutionFailed(
        "String or binary data would be truncated".to_string(),
    );
    assert!(err.to_string().contains("would be truncated"));
}

#[test]
fn test_invalid_connection_string_display() {
    let err = MssqlConnectionError::InvalidConnectionString("missing Server= entry".to_string());
    assert!(err.to_string().starts_with("Invalid connection string"));
}
