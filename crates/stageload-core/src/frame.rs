//! In-memory table snapshot handed to the loader

use crate::{LoadError, Result, Value};
use serde::{Deserialize, Serialize};

/// A named column of cell values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: &str, values: Vec<Value>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }
}

/// An ordered sequence of named columns, all the same length, with an
/// optional index column that a load option can promote to a regular column.
///
/// Owned exclusively by one load operation; the engine never mutates it
/// after normalization - chunking only slices it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    index: Option<Column>,
    columns: Vec<Column>,
}

impl Frame {
    /// Build a frame from columns, checking shape invariants
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let frame = Self {
            index: None,
            columns,
        };
        frame.check_shape()?;
        Ok(frame)
    }

    /// Attach an index column (same length as the regular columns)
    pub fn with_index(mut self, name: &str, values: Vec<Value>) -> Result<Self> {
        self.index = Some(Column::new(name, values));
        self.check_shape()?;
        Ok(self)
    }

    fn check_shape(&self) -> Result<()> {
        let mut names = std::collections::HashSet::new();
        for column in &self.columns {
            if !names.insert(column.name.as_str()) {
                return Err(LoadError::Frame(format!(
                    "Duplicate column name '{}'",
                    column.name
                )));
            }
        }
        let expected = self.columns.first().map(|c| c.values.len());
        if let Some(expected) = expected {
            for column in &self.columns {
                if column.values.len() != expected {
                    return Err(LoadError::Frame(format!(
                        "Column '{}' has {} rows, expected {}",
                        column.name,
                        column.values.len(),
                        expected
                    )));
                }
            }
            if let Some(index) = &self.index {
                if index.values.len() != expected {
                    return Err(LoadError::Frame(format!(
                        "Index column '{}' has {} rows, expected {}",
                        index.name,
                        index.values.len(),
                        expected
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.columns
            .first()
            .map(|c| c.values.len())
            .or_else(|| self.index.as_ref().map(|c| c.values.len()))
            .unwrap_or(0)
    }

    /// Number of regular columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// The regular columns in order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The index column, if any
    pub fn index(&self) -> Option<&Column> {
        self.index.as_ref()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Append a column (used by validation to synthesize missing columns)
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.column(&column.name).is_some() {
            return Err(LoadError::Frame(format!(
                "Duplicate column name '{}'",
                column.name
            )));
        }
        if !self.columns.is_empty() && column.values.len() != self.row_count() {
            return Err(LoadError::Frame(format!(
                "Column '{}' has {} rows, expected {}",
                column.name,
                column.values.len(),
                self.row_count()
            )));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Promote the index to the first regular column, synthesizing a
    /// positional `index` column when the frame carries none.
    pub fn promote_index(&mut self) -> Result<()> {
        let index = match self.index.take() {
            Some(index) => index,
            None => Column::new(
                "index",
                (0..self.row_count() as i64).map(Value::Int64).collect(),
            ),
        };
        if self.column(&index.name).is_some() {
            return Err(LoadError::Frame(format!(
                "Index name '{}' collides with an existing column",
                index.name
            )));
        }
        self.columns.insert(0, index);
        Ok(())
    }

    /// Discard the index column without promoting it
    pub fn drop_index(&mut self) {
        self.index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Vec<Value> {
        values.iter().copied().map(Value::Int64).collect()
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let result = Frame::new(vec![
            Column::new("a", ints(&[1, 2, 3])),
            Column::new("b", ints(&[1])),
        ]);
        assert!(matches!(result, Err(LoadError::Frame(_))));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Frame::new(vec![
            Column::new("a", ints(&[1])),
            Column::new("a", ints(&[2])),
        ]);
        assert!(matches!(result, Err(LoadError::Frame(_))));
    }

    #[test]
    fn test_promote_existing_index() {
        let mut frame = Frame::new(vec![Column::new("a", ints(&[10, 20]))])
            .unwrap()
            .with_index("row_id", ints(&[0, 1]))
            .unwrap();
        frame.promote_index().unwrap();
        assert_eq!(frame.columns()[0].name, "row_id");
        assert_eq!(frame.column_count(), 2);
    }

    #[test]
    fn test_promote_synthesizes_positional_index() {
        let mut frame = Frame::new(vec![Column::new("a", ints(&[10, 20, 30]))]).unwrap();
        frame.promote_index().unwrap();
        assert_eq!(frame.columns()[0].name, "index");
        assert_eq!(frame.columns()[0].values, ints(&[0, 1, 2]));
    }

    #[test]
    fn test_promote_collision_is_error() {
        let mut frame = Frame::new(vec![Column::new("index", ints(&[1]))]).unwrap();
        assert!(frame.promote_index().is_err());
    }
}
