use crate::error::SqlError;
use bigdecimal::{BigDecimal, FromPrimitive};
use query_structure::{exact_i64, parse_date, parse_datetime, parse_time, ScalarFieldData, TypeIdentifier, Value};
use rusqlite::types::ValueRef;
use std::str::FromStr;

/// Decodes a column into the value of the scalar field it stores.
pub(crate) fn from_sql_value(value: ValueRef<'_>, field: &ScalarFieldData) -> crate::Result<Value> {
    if let ValueRef::Null = value {
        return Ok(Value::Null);
    }

    if field.is_list {
        let text = text(value, field)?;
        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|err| conversion(field, err.to_string()))?;

        let serde_json::Value::Array(items) = json else {
            return Err(conversion(field, "expected a JSON array"));
        };

        let values = items
            .into_iter()
            .map(|item| Value::from_json(item).coerce(field.type_identifier))
            .collect::<Result<Vec<_>, _>>()?;

        return Ok(Value::List(values));
    }

    let decoded = match (field.type_identifier, value) {
        (TypeIdentifier::Boolean, ValueRef::Integer(i)) => Value::Boolean(i != 0),
        (TypeIdentifier::Int, ValueRef::Integer(i)) => Value::Int(i),
        (TypeIdentifier::Int, ValueRef::Real(f)) => exact_i64(f)
            .map(Value::Int)
            .ok_or_else(|| conversion(field, f.to_string()))?,
        (TypeIdentifier::Float, ValueRef::Real(f)) => Value::Float(f),
        (TypeIdentifier::Float, ValueRef::Integer(i)) => Value::Float(i as f64),
        (TypeIdentifier::Decimal, ValueRef::Integer(i)) => Value::Decimal(BigDecimal::from(i)),
        (TypeIdentifier::Decimal, ValueRef::Real(f)) => BigDecimal::from_f64(f)
            .map(Value::Decimal)
            .ok_or_else(|| conversion(field, f.to_string()))?,
        (TypeIdentifier::Decimal, value @ ValueRef::Text(_)) => {
            let text = text(value, field)?;
            BigDecimal::from_str(text)
                .map(Value::Decimal)
                .map_err(|err| conversion(field, err.to_string()))?
        }
        (TypeIdentifier::String, value @ ValueRef::Text(_)) => Value::String(text(value, field)?.to_owned()),
        (TypeIdentifier::String, ValueRef::Integer(i)) => Value::String(i.to_string()),
        (TypeIdentifier::Date, value @ ValueRef::Text(_)) => Value::Date(parse_date(text(value, field)?)?),
        (TypeIdentifier::DateTime, value @ ValueRef::Text(_)) => {
            Value::DateTime(parse_datetime(text(value, field)?)?)
        }
        (TypeIdentifier::Time, value @ ValueRef::Text(_)) => Value::Time(parse_time(text(value, field)?)?),
        (TypeIdentifier::Json, value @ ValueRef::Text(_)) => {
            let json = serde_json::from_str(text(value, field)?).map_err(|err| conversion(field, err.to_string()))?;
            Value::Json(json)
        }
        (_, value) => {
            return Err(conversion(
                field,
                format!("unexpected storage class {:?}", value.data_type()),
            ))
        }
    };

    Ok(decoded)
}

fn text<'a>(value: ValueRef<'a>, field: &ScalarFieldData) -> crate::Result<&'a str> {
    value.as_str().map_err(|err| conversion(field, err.to_string()))
}

fn conversion(field: &ScalarFieldData, message: impl AsRef<str>) -> SqlError {
    SqlError::ConversionError(format!("{} ({}): {}", field.name, field.type_identifier, message.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::to_sql_value;
    use query_structure::ScalarFieldBuilder;

    fn field(builder: ScalarFieldBuilder) -> ScalarFieldData {
        builder.build()
    }

    #[test]
    fn lists_are_decoded_from_json_text() {
        let tags = field(ScalarFieldBuilder::string("tags").list());
        let stored = to_sql_value(&Value::List(vec![Value::from("a"), Value::from("b")]));
        let decoded = from_sql_value(ValueRef::from(&stored), &tags).unwrap();

        assert_eq!(decoded, Value::List(vec![Value::from("a"), Value::from("b")]));
    }

    #[test]
    fn booleans_come_back_from_integers() {
        let flag = field(ScalarFieldBuilder::new("flag", TypeIdentifier::Boolean));

        assert_eq!(from_sql_value(ValueRef::Integer(1), &flag).unwrap(), Value::Boolean(true));
        assert_eq!(from_sql_value(ValueRef::Null, &flag).unwrap(), Value::Null);
    }

    #[test]
    fn reals_stored_in_int_columns_must_be_exact() {
        let count = field(ScalarFieldBuilder::int("count"));

        assert_eq!(from_sql_value(ValueRef::Real(4.0), &count).unwrap(), Value::Int(4));
        assert!(from_sql_value(ValueRef::Real(4.5), &count).is_err());
        assert!(from_sql_value(ValueRef::Real(1e300), &count).is_err());
    }
}
