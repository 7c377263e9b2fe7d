//! Core value and column types for stageload

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scalar cell value as supplied by the caller's in-memory table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean
    Bool(bool),
    /// 16-bit signed integer
    Int16(i16),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// 32-bit floating point
    Float32(f32),
    /// 64-bit floating point
    Float64(f64),
    /// Decimal/Numeric (stored as string for precision)
    Decimal(String),
    /// UTF-8 string
    String(String),
    /// UUID
    Uuid(Uuid),
    /// Date (year, month, day)
    Date(NaiveDate),
    /// DateTime without timezone
    DateTime(NaiveDateTime),
    /// DateTime with timezone (UTC)
    DateTimeUtc(DateTime<Utc>),
}

impl Value {
    /// Check if the value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int16(v) => Some(*v as i64),
            Value::Int32(v) => Some(*v as i64),
            Value::Int64(v) => Some(*v),
            Value::String(s) => s.parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Try to get as f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(v) => Some(*v as f64),
            Value::Float64(v) => Some(*v),
            Value::String(s) => s.parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Try to get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::String(v) => write!(f, "{}", v),
            Value::Uuid(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v),
            // Rendered without the zone suffix so the text can be embedded in
            // a T-SQL datetime literal as-is.
            Value::DateTimeUtc(v) => write!(f, "{}", v.naive_utc()),
        }
    }
}

/// Classification of a destination column's declared SQL data type.
///
/// Parsed once per column from the INFORMATION_SCHEMA `DATA_TYPE` string and
/// used to pick the literal encoding rule for every cell in that column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlTypeFamily {
    /// ANSI character types (varchar, char, text)
    Char,
    /// Unicode character types (nvarchar, nchar, ntext)
    NChar,
    /// Date and time types
    DateTime,
    /// Whole-number types
    Integer,
    /// Exact numeric types (decimal, numeric)
    Decimal,
    /// Approximate numeric types (float, real)
    Float,
    /// Currency types (money, smallmoney)
    Money,
    /// Boolean (bit)
    Boolean,
    /// Anything else - not encodable by the loader
    Other(String),
}

impl SqlTypeFamily {
    /// Classify a raw `DATA_TYPE` string
    pub fn parse(data_type: &str) -> Self {
        match data_type.trim().to_ascii_lowercase().as_str() {
            "varchar" | "char" | "text" => SqlTypeFamily::Char,
            "nvarchar" | "nchar" | "ntext" => SqlTypeFamily::NChar,
            "date" | "datetime" | "datetime2" | "smalldatetime" | "time" | "datetimeoffset" => {
                SqlTypeFamily::DateTime
            }
            "bigint" | "int" | "smallint" | "tinyint" => SqlTypeFamily::Integer,
            "decimal" | "numeric" => SqlTypeFamily::Decimal,
            "float" | "real" => SqlTypeFamily::Float,
            "money" | "smallmoney" => SqlTypeFamily::Money,
            "bit" => SqlTypeFamily::Boolean,
            other => SqlTypeFamily::Other(other.to_string()),
        }
    }

    /// Whether values of this family are embedded inside quotes
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            SqlTypeFamily::Char | SqlTypeFamily::NChar | SqlTypeFamily::DateTime
        )
    }
}

/// Metadata for one destination column, sourced from the live schema.
///
/// Immutable for the duration of a single load operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name as reported by the database
    pub name: String,
    /// Bracket-quoted name safe to embed in statements
    pub quoted_name: String,
    /// Raw declared data type (e.g. "nvarchar")
    pub data_type: String,
    /// Type family driving the literal encoding rule
    pub family: SqlTypeFamily,
    /// Whether the column accepts NULL
    pub nullable: bool,
    /// Maximum character length for character types (None = unbounded)
    pub max_char_length: Option<i64>,
    /// Identity columns are populated by the database and excluded from
    /// every write path
    pub is_identity: bool,
}

impl ColumnSpec {
    /// Build a spec from raw schema metadata
    pub fn new(name: &str, data_type: &str, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            quoted_name: format!("[{}]", name),
            data_type: data_type.to_string(),
            family: SqlTypeFamily::parse(data_type),
            nullable,
            max_char_length: None,
            is_identity: false,
        }
    }

    /// Set the maximum character length
    pub fn with_max_char_length(mut self, max: i64) -> Self {
        self.max_char_length = Some(max);
        self
    }

    /// Mark the column as an identity column
    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self
    }
}

/// The set of columns used for insertion: destination columns minus
/// identity columns, in destination order.
pub fn insertable_columns(specs: &[ColumnSpec]) -> Vec<ColumnSpec> {
    specs.iter().filter(|c| !c.is_identity).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_family_parse() {
        assert_eq!(SqlTypeFamily::parse("varchar"), SqlTypeFamily::Char);
        assert_eq!(SqlTypeFamily::parse("NVARCHAR"), SqlTypeFamily::NChar);
        assert_eq!(SqlTypeFamily::parse("datetime2"), SqlTypeFamily::DateTime);
        assert_eq!(SqlTypeFamily::parse("bigint"), SqlTypeFamily::Integer);
        assert_eq!(SqlTypeFamily::parse("numeric"), SqlTypeFamily::Decimal);
        assert_eq!(SqlTypeFamily::parse("real"), SqlTypeFamily::Float);
        assert_eq!(SqlTypeFamily::parse("smallmoney"), SqlTypeFamily::Money);
        assert_eq!(SqlTypeFamily::parse("bit"), SqlTypeFamily::Boolean);
        assert_eq!(
            SqlTypeFamily::parse("varbinary"),
            SqlTypeFamily::Other("varbinary".into())
        );
    }

    #[test]
    fn test_column_spec_quoting() {
        let spec = ColumnSpec::new("Order Id", "int", false);
        assert_eq!(spec.quoted_name, "[Order Id]");
        assert_eq!(spec.family, SqlTypeFamily::Integer);
    }

    #[test]
    fn test_insertable_excludes_identity() {
        let specs = vec![
            ColumnSpec::new("id", "int", false).identity(),
            ColumnSpec::new("name", "varchar", true).with_max_char_length(50),
        ];
        let insertable = insertable_columns(&specs);
        assert_eq!(insertable.len(), 1);
        assert_eq!(insertable[0].name, "name");
    }

    #[test]
    fn test_datetime_utc_display_has_no_zone_suffix() {
        let dt = chrono::DateTime::parse_from_rfc3339("2024-06-15T14:30:45Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(Value::DateTimeUtc(dt).to_string(), "2024-06-15 14:30:45");
    }
}
