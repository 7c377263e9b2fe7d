//! Tests for the literal encoder

use crate::encode::{encode_literal, encoded_width};
use stageload_core::{ColumnSpec, LoadError, Value};

fn varchar(name: &str) -> ColumnSpec {
    ColumnSpec::new(name, "varchar", true)
}

fn nvarchar(name: &str) -> ColumnSpec {
    ColumnSpec::new(name, "nvarchar", true)
}

#[test]
fn test_null_encodes_to_null_keyword() {
    assert_eq!(
        encode_literal(&Value::Null, &varchar("c")).unwrap(),
        "NULL"
    );
    assert_eq!(
        encode_literal(&Value::Null, &ColumnSpec::new("c", "int", true)).unwrap(),
        "NULL"
    );
}

#[test]
fn test_char_quoting_doubles_embedded_quotes() {
    let literal = encode_literal(&Value::String("O'Brien".into()), &varchar("c")).unwrap();
    assert_eq!(literal, "'O''Brien'");
}

#[test]
fn test_newline_becomes_concatenation_break() {
    let literal = encode_literal(&Value::String("line1\nline2".into()), &varchar("c")).unwrap();
    assert_eq!(literal, "'line1' + CHAR(10) + 'line2'");
}

#[test]
fn test_unicode_prefix_on_every_fragment() {
    let literal = encode_literal(&Value::String("a\nb".into()), &nvarchar("c")).unwrap();
    assert_eq!(literal, "N'a' + CHAR(10) + N'b'");
}

#[test]
fn test_datetime_family_is_quoted_text() {
    let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let column = ColumnSpec::new("c", "datetime2", true);
    assert_eq!(
        encode_literal(&Value::Date(date), &column).unwrap(),
        "'2024-01-15'"
    );

    let dt = date.and_hms_opt(9, 30, 0).unwrap();
    assert_eq!(
        encode_literal(&Value::DateTime(dt), &column).unwrap(),
        "'2024-01-15 09:30:00'"
    );
}

#[test]
fn test_integer_encoding() {
    let column = ColumnSpec::new("c", "int", true);
    assert_eq!(encode_literal(&Value::Int64(42), &column).unwrap(), "42");
    // Whole-number floats are accepted for nullable integer data.
    assert_eq!(encode_literal(&Value::Float64(3.0), &column).unwrap(), "3");
    assert_eq!(
        encode_literal(&Value::String("17".into()), &column).unwrap(),
        "17"
    );
    assert!(matches!(
        encode_literal(&Value::Float64(3.5), &column),
        Err(LoadError::Encoding(_))
    ));
    assert!(matches!(
        encode_literal(&Value::String("abc".into()), &column),
        Err(LoadError::Encoding(_))
    ));
}

#[test]
fn test_numeric_encoding_is_unquoted() {
    let decimal = ColumnSpec::new("c", "decimal", true);
    assert_eq!(
        encode_literal(&Value::Decimal("123.456".into()), &decimal).unwrap(),
        "123.456"
    );
    let money = ColumnSpec::new("c", "money", true);
    assert_eq!(
        encode_literal(&Value::Float64(9.99), &money).unwrap(),
        "9.99"
    );
    let float = ColumnSpec::new("c", "float", true);
    assert!(matches!(
        encode_literal(&Value::String("not a number".into()), &float),
        Err(LoadError::Encoding(_))
    ));
}

#[test]
fn test_boolean_truthy_spellings() {
    let column = ColumnSpec::new("c", "bit", true);
    assert_eq!(encode_literal(&Value::Bool(true), &column).unwrap(), "1");
    assert_eq!(encode_literal(&Value::Int64(0), &column).unwrap(), "0");
    for spelling in ["true", "T", "Yes", "y", "1"] {
        assert_eq!(
            encode_literal(&Value::String(spelling.into()), &column).unwrap(),
            "1",
            "spelling {spelling:?}"
        );
    }
    for spelling in ["False", "f", "NO", "n", "0"] {
        assert_eq!(
            encode_literal(&Value::String(spelling.into()), &column).unwrap(),
            "0",
            "spelling {spelling:?}"
        );
    }
}

#[test]
fn test_unparsable_boolean_is_encoding_error() {
    let column = ColumnSpec::new("c", "bit", true);
    assert!(matches!(
        encode_literal(&Value::String("maybe".into()), &column),
        Err(LoadError::Encoding(_))
    ));
    assert!(matches!(
        encode_literal(&Value::Int64(2), &column),
        Err(LoadError::Encoding(_))
    ));
}

#[test]
fn test_unsupported_type_is_encoding_error() {
    let column = ColumnSpec::new("c", "varbinary", true);
    let err = encode_literal(&Value::String("x".into()), &column).unwrap_err();
    assert!(err.to_string().contains("varbinary"));
}

#[test]
fn test_encoded_width_counts_escaped_characters() {
    // The doubled quote counts twice: that is the statement text that will
    // be sent, and the truncation check measures exactly that.
    assert_eq!(
        encoded_width(&Value::String("O'Brien".into()), &varchar("c")),
        Some(8)
    );
    // The newline rewrite substitutes CHAR(10) for the one character.
    assert_eq!(
        encoded_width(&Value::String("a\nb".into()), &varchar("c")),
        Some(3)
    );
    assert_eq!(encoded_width(&Value::Null, &varchar("c")), None);
    assert_eq!(
        encoded_width(&Value::Int64(12345), &ColumnSpec::new("c", "int", true)),
        None
    );
}

/// Undo the encoder's quoting the way a database read would surface the
/// stored text.
fn decode_literal(literal: &str) -> String {
    literal
        .split(" + CHAR(10) + ")
        .map(|fragment| {
            let body = fragment
                .strip_prefix("N'")
                .or_else(|| fragment.strip_prefix('\''))
                .unwrap_or(fragment);
            let body = body.strip_suffix('\'').unwrap_or(body);
            body.replace("''", "'")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_round_trip_quote_and_newline() {
    let original = "It's a\nmulti-line 'quoted' value";
    for column in [varchar("c"), nvarchar("c")] {
        let literal = encode_literal(&Value::String(original.into()), &column).unwrap();
        assert_eq!(decode_literal(&literal), original);
    }
}
