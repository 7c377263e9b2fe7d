//! Type-directed literal encoding
//!
//! Converts one cell value plus its destination column type into a literal
//! suitable for embedding in an INSERT statement. Pure, no I/O.

use stageload_core::{ColumnSpec, LoadError, Result, SqlTypeFamily, Value};

/// Encode a cell as a statement literal according to the destination
/// column's type family.
pub fn encode_literal(value: &Value, column: &ColumnSpec) -> Result<String> {
    if value.is_null() {
        return Ok("NULL".to_string());
    }
    match &column.family {
        SqlTypeFamily::Char | SqlTypeFamily::DateTime => Ok(quote_text(&value.to_string(), false)),
        SqlTypeFamily::NChar => Ok(quote_text(&value.to_string(), true)),
        SqlTypeFamily::Integer => encode_integer(value, column),
        SqlTypeFamily::Decimal | SqlTypeFamily::Float | SqlTypeFamily::Money => {
            encode_numeric(value, column)
        }
        SqlTypeFamily::Boolean => encode_boolean(value, column),
        SqlTypeFamily::Other(data_type) => Err(LoadError::Encoding(format!(
            "Column '{}' has unsupported data type '{}'",
            column.name, data_type
        ))),
    }
}

/// The character width the encoded value occupies between the quotes, used
/// by the truncation check. Returns None for NULL cells and non-text
/// columns.
///
/// Measured on the escaped text, so a doubled quote counts as two
/// characters. This intentionally matches the statement that will be sent
/// rather than the source value's native length; the newline rewrite does
/// not change the count (CHAR(10) stands in for the one source character).
pub fn encoded_width(value: &Value, column: &ColumnSpec) -> Option<usize> {
    if value.is_null() || !column.family.is_text() {
        return None;
    }
    Some(value.to_string().replace('\'', "''").chars().count())
}

/// Quote a text fragment, doubling embedded quotes and rewriting embedded
/// newlines as a string-concatenation break so multi-line text survives a
/// single-statement, line-oriented transport.
fn quote_text(text: &str, unicode: bool) -> String {
    let prefix = if unicode { "N" } else { "" };
    let escaped = text.replace('\'', "''");
    escaped
        .split('\n')
        .map(|fragment| format!("{}'{}'", prefix, fragment))
        .collect::<Vec<_>>()
        .join(" + CHAR(10) + ")
}

fn encode_integer(value: &Value, column: &ColumnSpec) -> Result<String> {
    match value {
        Value::Int16(v) => Ok(v.to_string()),
        Value::Int32(v) => Ok(v.to_string()),
        Value::Int64(v) => Ok(v.to_string()),
        // Float-typed cells are common for nullable integer data; accept
        // them when they carry a whole number.
        Value::Float32(v) if v.is_finite() && v.fract() == 0.0 => Ok((*v as i64).to_string()),
        Value::Float64(v) if v.is_finite() && v.fract() == 0.0 => Ok((*v as i64).to_string()),
        Value::Decimal(s) | Value::String(s) => {
            s.trim().parse::<i64>().map(|v| v.to_string()).map_err(|_| {
                LoadError::Encoding(format!(
                    "Cannot encode '{}' as integer for column '{}'",
                    s, column.name
                ))
            })
        }
        other => Err(LoadError::Encoding(format!(
            "Cannot encode {:?} as integer for column '{}'",
            other, column.name
        ))),
    }
}

fn encode_numeric(value: &Value, column: &ColumnSpec) -> Result<String> {
    match value {
        Value::Int16(v) => Ok(v.to_string()),
        Value::Int32(v) => Ok(v.to_string()),
        Value::Int64(v) => Ok(v.to_string()),
        Value::Float32(v) if v.is_finite() => Ok(v.to_string()),
        Value::Float64(v) if v.is_finite() => Ok(v.to_string()),
        Value::Decimal(s) | Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<f64>().map(|_| trimmed.to_string()).map_err(|_| {
                LoadError::Encoding(format!(
                    "Cannot encode '{}' as numeric for column '{}'",
                    s, column.name
                ))
            })
        }
        other => Err(LoadError::Encoding(format!(
            "Cannot encode {:?} as numeric for column '{}'",
            other, column.name
        ))),
    }
}

fn encode_boolean(value: &Value, column: &ColumnSpec) -> Result<String> {
    let flag = match value {
        Value::Bool(v) => *v,
        Value::Int16(0) | Value::Int32(0) | Value::Int64(0) => false,
        Value::Int16(1) | Value::Int32(1) | Value::Int64(1) => true,
        Value::String(s) => parse_truthy(s).ok_or_else(|| {
            LoadError::Encoding(format!(
                "Cannot encode '{}' as boolean for column '{}'",
                s, column.name
            ))
        })?,
        other => {
            return Err(LoadError::Encoding(format!(
                "Cannot encode {:?} as boolean for column '{}'",
                other, column.name
            )));
        }
    };
    Ok(if flag { "1" } else { "0" }.to_string())
}

/// Strict truthy-string parser: common true/false spellings only
fn parse_truthy(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}
