//! Database driver trait definition

use crate::{BulkConnection, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Core driver trait the staging engine consumes.
///
/// Every worker opens its own connection through this trait; connections
/// are never shared across workers.
#[async_trait]
pub trait BulkDriver: Send + Sync {
    /// Unique identifier for this driver (e.g. "mssql")
    fn name(&self) -> &'static str;

    /// Open a new private connection
    async fn connect(&self, connection_string: &str) -> Result<Arc<dyn BulkConnection>>;
}
