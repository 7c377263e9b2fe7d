//! MS SQL Server table description via INFORMATION_SCHEMA

use crate::connection::MssqlConnection;
use async_trait::async_trait;
use stageload_core::{ColumnSpec, LoadError, Result, SchemaSource};

/// Column metadata in ordinal order, with the identity flag the loader uses
/// to exclude database-populated columns from the write path.
pub(crate) const DESCRIBE_TABLE_QUERY: &str = "SELECT
    COLUMN_NAME,
    DATA_TYPE,
    IS_NULLABLE,
    CHARACTER_MAXIMUM_LENGTH,
    COLUMNPROPERTY(OBJECT_ID(QUOTENAME(TABLE_SCHEMA) + '.' + QUOTENAME(TABLE_NAME)),
                   COLUMN_NAME, 'IsIdentity') AS IS_IDENTITY
 FROM INFORMATION_SCHEMA.COLUMNS
 WHERE TABLE_NAME = @P1 AND TABLE_SCHEMA = @P2
 ORDER BY ORDINAL_POSITION";

#[async_trait]
impl SchemaSource for MssqlConnection {
    #[tracing::instrument(skip(self))]
    async fn describe_table(&self, table: &str, schema: &str) -> Result<Vec<ColumnSpec>> {
        let rows = self
            .query_rows(DESCRIBE_TABLE_QUERY, &[&table, &schema])
            .await?;

        let mut specs = Vec::with_capacity(rows.len());
        for row in &rows {
            specs.push(column_spec_from_row(row)?);
        }
        tracing::debug!(table = %table, schema = %schema, columns = specs.len(), "described table");
        Ok(specs)
    }
}

fn column_spec_from_row(row: &tiberius::Row) -> Result<ColumnSpec> {
    let name: &str = row
        .try_get(0)
        .map_err(|e| LoadError::Schema(e.to_string()))?
        .ok_or_else(|| LoadError::Schema("column metadata row missing COLUMN_NAME".to_string()))?;
    let data_type: &str = row
        .try_get(1)
        .map_err(|e| LoadError::Schema(e.to_string()))?
        .ok_or_else(|| LoadError::Schema("column metadata row missing DATA_TYPE".to_string()))?;
    let is_nullable: Option<&str> = row
        .try_get(2)
        .map_err(|e| LoadError::Schema(e.to_string()))?;
    let max_char_length: Option<i32> = row
        .try_get(3)
        .map_err(|e| LoadError::Schema(e.to_string()))?;
    let identity_flag: Option<i32> = row
        .try_get(4)
        .map_err(|e| LoadError::Schema(e.to_string()))?;

    Ok(build_column_spec(
        name,
        data_type,
        is_nullable,
        max_char_length,
        identity_flag,
    ))
}

/// Pure mapping from INFORMATION_SCHEMA values to a `ColumnSpec`
pub(crate) fn build_column_spec(
    name: &str,
    data_type: &str,
    is_nullable: Option<&str>,
    max_char_length: Option<i32>,
    identity_flag: Option<i32>,
) -> ColumnSpec {
    let nullable = is_nullable
        .map(|value| value.eq_ignore_ascii_case("YES"))
        .unwrap_or(true);
    let mut spec = ColumnSpec::new(name, data_type, nullable);
    // varchar(max) and the *text types report -1: unbounded, no limit to
    // enforce.
    if let Some(max) = max_char_length.filter(|max| *max >= 0) {
        spec = spec.with_max_char_length(max as i64);
    }
    if identity_flag == Some(1) {
        spec = spec.identity();
    }
    spec
}
