//! Bulk-load connection trait

use crate::{Result, SchemaSource};
use async_trait::async_trait;

/// A private database connection owned by one worker (or by the
/// orchestrator for schema description and merging).
///
/// Statements are opaque text; the loader embeds values as literals rather
/// than binding parameters, a deliberate deviation from parameterized
/// queries so that many rows fit in one round trip.
#[async_trait]
pub trait BulkConnection: Send + Sync {
    /// Get the driver name (e.g. "mssql")
    fn driver_name(&self) -> &str;

    /// Execute a statement, returning the number of affected rows
    async fn execute(&self, sql: &str) -> Result<u64>;

    /// Commit any pending work on this connection
    async fn commit(&self) -> Result<()>;

    /// Close the connection
    async fn close(&self) -> Result<()>;

    /// Check if the connection is closed
    fn is_closed(&self) -> bool;

    /// Get the schema description interface if supported
    fn as_schema_source(&self) -> Option<&dyn SchemaSource> {
        None
    }
}
