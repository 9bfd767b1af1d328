use crate::{DomainError, TypeIdentifier};
use bigdecimal::{BigDecimal, FromPrimitive};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

pub type ValueMap = IndexMap<String, Value>;

/// A value flowing between the API surface, the executor and storage.
///
/// Objects and lists appear in nested write payloads and in result trees;
/// storage only ever sees scalars and lists of scalars.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int(i64),
    Float(f64),
    Decimal(BigDecimal),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Json(serde_json::Value),
    List(Vec<Value>),
    Object(ValueMap),
}

// Floats compare by bit pattern when hashed, which is enough to group records by
// their identifiers.
impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);

        match self {
            Value::Null => (),
            Value::Boolean(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Decimal(d) => d.hash(state),
            Value::String(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
            Value::DateTime(dt) => dt.hash(state),
            Value::Time(t) => t.hash(state),
            Value::Json(json) => json.to_string().hash(state),
            Value::List(values) => values.hash(state),
            Value::Object(map) => {
                for (key, value) in map {
                    key.hash(state);
                    value.hash(state);
                }
            }
        }
    }
}

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}

pub fn format_time(time: &NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| DomainError::conversion(s, "Date"))
}

/// Accepts ISO 8601 with either `T` or a space as separator, with or without
/// an offset. Offsets are normalized to UTC.
pub fn parse_datetime(s: &str) -> crate::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .or_else(|_| DateTime::parse_from_rfc3339(s).map(|dt| dt.naive_utc()))
        .map_err(|_| DomainError::conversion(s, "DateTime"))
}

pub fn parse_time(s: &str) -> crate::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| DomainError::conversion(s, "Time"))
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ValueMap> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn into_object(self) -> Option<ValueMap> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<Value>> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    /// Treats empty strings and empty lists as missing, the way "blank"
    /// checks do.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::List(values) => values.is_empty(),
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Coerces the value into the representation of the given scalar type.
    /// Used for values coming from untyped sources, such as user callbacks
    /// or stored defaults.
    pub fn coerce(self, type_identifier: TypeIdentifier) -> crate::Result<Value> {
        let fail = |value: &Value| DomainError::conversion(value.to_string(), format!("{type_identifier:?}"));

        let coerced = match (type_identifier, self) {
            (_, Value::Null) => Value::Null,
            (TypeIdentifier::Boolean, Value::Boolean(b)) => Value::Boolean(b),
            (TypeIdentifier::Boolean, Value::Int(i)) => Value::Boolean(i != 0),
            (TypeIdentifier::Int, Value::Int(i)) => Value::Int(i),
            (TypeIdentifier::Int, Value::Float(f)) => {
                exact_i64(f).map(Value::Int).ok_or_else(|| fail(&Value::Float(f)))?
            }
            (TypeIdentifier::Int, Value::String(s)) => {
                let parsed = s.trim().parse::<i64>();
                parsed.map(Value::Int).map_err(|_| fail(&Value::String(s)))?
            }
            (TypeIdentifier::Float, Value::Float(f)) => Value::Float(f),
            (TypeIdentifier::Float, Value::Int(i)) => Value::Float(i as f64),
            (TypeIdentifier::Float, Value::Decimal(d)) => {
                let parsed = d.to_string().parse::<f64>();
                parsed.map(Value::Float).map_err(|_| fail(&Value::Decimal(d)))?
            }
            (TypeIdentifier::Decimal, Value::Decimal(d)) => Value::Decimal(d),
            (TypeIdentifier::Decimal, Value::Int(i)) => Value::Decimal(BigDecimal::from(i)),
            (TypeIdentifier::Decimal, Value::Float(f)) => {
                BigDecimal::from_f64(f).map(Value::Decimal).ok_or_else(|| fail(&Value::Float(f)))?
            }
            (TypeIdentifier::Decimal, Value::String(s)) => match BigDecimal::from_str(s.trim()) {
                Ok(d) => Value::Decimal(d),
                Err(_) => return Err(fail(&Value::String(s))),
            },
            (TypeIdentifier::String, Value::String(s)) => Value::String(s),
            (TypeIdentifier::Date, Value::Date(d)) => Value::Date(d),
            (TypeIdentifier::Date, Value::DateTime(dt)) => Value::Date(dt.date()),
            (TypeIdentifier::Date, Value::String(s)) => Value::Date(parse_date(&s)?),
            (TypeIdentifier::DateTime, Value::DateTime(dt)) => Value::DateTime(dt),
            (TypeIdentifier::DateTime, Value::String(s)) => Value::DateTime(parse_datetime(&s)?),
            (TypeIdentifier::Time, Value::Time(t)) => Value::Time(t),
            (TypeIdentifier::Time, Value::String(s)) => Value::Time(parse_time(&s)?),
            (TypeIdentifier::Json, Value::Json(json)) => Value::Json(json),
            (TypeIdentifier::Json, other) => Value::Json(other.to_json()),
            (_, other) => return Err(fail(&other)),
        };

        Ok(coerced)
    }

    /// Plain JSON rendering, without any schema knowledge.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Decimal(d) => serde_json::Value::String(d.to_string()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(format_date(d)),
            Value::DateTime(dt) => serde_json::Value::String(format_datetime(dt)),
            Value::Time(t) => serde_json::Value::String(format_time(t)),
            Value::Json(json) => json.clone(),
            Value::List(values) => serde_json::Value::Array(values.iter().map(Value::to_json).collect()),
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    /// The inverse of [Value::to_json] for untyped JSON. Numbers become `Int`
    /// when they fit, `Float` otherwise.
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(values) => Value::List(values.into_iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(key, value)| (key, Value::from_json(value))).collect())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::String(s) => f.write_str(s),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Date(d) => f.write_str(&format_date(d)),
            Value::DateTime(dt) => f.write_str(&format_datetime(dt)),
            Value::Time(t) => f.write_str(&format_time(t)),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<BigDecimal> for Value {
    fn from(d: BigDecimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::Time(t)
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Object(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// The integer a float holds, when it holds one exactly and in range.
pub fn exact_i64(f: f64) -> Option<i64> {
    // 2^63 is exactly representable; i64::MAX is not.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;

    if f.fract() == 0.0 && (-BOUND..BOUND).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn floats_only_become_ints_when_exact_and_in_range() {
        assert_eq!(Value::Float(3.0).coerce(TypeIdentifier::Int), Ok(Value::Int(3)));
        assert!(Value::Float(3.5).coerce(TypeIdentifier::Int).is_err());
        assert!(Value::Float(1e19).coerce(TypeIdentifier::Int).is_err());
        assert!(Value::Float(f64::NAN).coerce(TypeIdentifier::Int).is_err());
        assert_eq!(exact_i64(-9_223_372_036_854_775_808.0), Some(i64::MIN));
        assert_eq!(exact_i64(f64::INFINITY), None);
    }

    #[test]
    fn coercion_follows_the_target_type() {
        assert_eq!(Value::from("42").coerce(TypeIdentifier::Int), Ok(Value::Int(42)));
        assert_eq!(Value::Int(1).coerce(TypeIdentifier::Boolean), Ok(Value::Boolean(true)));
        assert_eq!(
            Value::from("2021-03-04").coerce(TypeIdentifier::Date),
            Ok(Value::Date(NaiveDate::from_ymd_opt(2021, 3, 4).unwrap()))
        );
        assert!(Value::from("forty-two").coerce(TypeIdentifier::Int).is_err());
    }

    #[test]
    fn datetimes_accept_both_separators() {
        let expected = NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_milli_opt(3, 4, 5, 600)
            .unwrap();

        assert_eq!(parse_datetime("2020-01-02T03:04:05.600").unwrap(), expected);
        assert_eq!(parse_datetime("2020-01-02 03:04:05.600").unwrap(), expected);
        assert_eq!(parse_datetime("2020-01-02T03:04:05.600Z").unwrap(), expected);
    }

    #[test]
    fn json_conversion_keeps_integers_apart_from_floats() {
        let value = Value::from_json(json!({ "a": 1, "b": 1.5, "c": [null, "x"] }));

        assert_eq!(
            value,
            Value::Object(IndexMap::from([
                ("a".to_owned(), Value::Int(1)),
                ("b".to_owned(), Value::Float(1.5)),
                ("c".to_owned(), Value::List(vec![Value::Null, Value::from("x")])),
            ]))
        );
        assert_eq!(value.to_json(), json!({ "a": 1, "b": 1.5, "c": [null, "x"] }));
    }
}
