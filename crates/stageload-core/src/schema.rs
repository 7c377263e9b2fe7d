//! Destination schema description trait

use crate::{ColumnSpec, Result};
use async_trait::async_trait;

/// Describes a destination table from its live schema.
///
/// Implementations return columns in ordinal order including the identity
/// flag, which drives identity-column exclusion and validation.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Describe a table's columns
    async fn describe_table(&self, table: &str, schema: &str) -> Result<Vec<ColumnSpec>>;
}
