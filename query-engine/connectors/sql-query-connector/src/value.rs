use query_structure::{format_date, format_datetime, format_time, Value};
use rusqlite::types::Value as SqlValue;

/// Storage representation of a value. Dates and times are kept as ISO text
/// so they sort and compare lexically; lists and JSON are kept as JSON text.
pub(crate) fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::Integer(*b as i64),
        Value::Int(i) => SqlValue::Integer(*i),
        Value::Float(f) => SqlValue::Real(*f),
        Value::Decimal(d) => SqlValue::Text(d.normalized().to_string()),
        Value::String(s) => SqlValue::Text(s.clone()),
        Value::Date(d) => SqlValue::Text(format_date(d)),
        Value::DateTime(dt) => SqlValue::Text(format_datetime(dt)),
        Value::Time(t) => SqlValue::Text(format_time(t)),
        Value::Json(json) => SqlValue::Text(json.to_string()),
        Value::List(_) | Value::Object(_) => SqlValue::Text(value.to_json().to_string()),
    }
}

/// Decimals compare as floating point numbers in SQL.
pub(crate) fn to_comparable_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Decimal(d) => match d.to_string().parse::<f64>() {
            Ok(f) => SqlValue::Real(f),
            Err(_) => to_sql_value(value),
        },
        _ => to_sql_value(value),
    }
}
