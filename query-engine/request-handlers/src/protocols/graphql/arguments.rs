use super::document::root_type_name;
use crate::{HandlerError, Result};
use indexmap::IndexMap;
use query_structure::{Value, ValueMap};
use schema::{QueryTag, RootField, ScalarType, TypeNode};

type Json = serde_json::Value;

/// Checks the arguments of a root field against its declared input types
/// and converts them into storage values: enum keys become the stored
/// values, dates and decimals are parsed.
pub(crate) fn coerce_arguments(tag: QueryTag, field: &RootField, arguments: &IndexMap<String, Json>) -> Result<ValueMap> {
    if let Some(unknown) = arguments.keys().find(|name| !field.arguments.contains_key(*name)) {
        return Err(HandlerError::malformed(format!(
            "Unknown argument \"{unknown}\" on field \"{}.{}\".",
            root_type_name(tag),
            field.name
        )));
    }

    let mut coerced = ValueMap::with_capacity(arguments.len());

    for (name, ty) in &field.arguments {
        match arguments.get(name) {
            Some(value) => {
                coerced.insert(name.clone(), coerce(value, ty)?);
            }
            None if ty.is_required() => {
                return Err(HandlerError::malformed(format!(
                    "Field \"{}\" argument \"{name}\" of type \"{ty}\" is required, but it was not provided.",
                    field.name
                )));
            }
            None => (),
        }
    }

    Ok(coerced)
}

fn coerce(value: &Json, ty: &TypeNode) -> Result<Value> {
    match (ty, value) {
        (TypeNode::Required(_), Json::Null) => Err(HandlerError::malformed(format!(
            "Expected value of type \"{ty}\", found null."
        ))),
        (TypeNode::Required(inner), value) => coerce(value, inner),
        (_, Json::Null) => Ok(Value::Null),

        (TypeNode::List(inner), Json::Array(items)) => {
            let items = items.iter().map(|item| coerce(item, inner)).collect::<Result<_>>()?;
            Ok(Value::List(items))
        }
        // A single value is accepted where a list is expected.
        (TypeNode::List(inner), value) => Ok(Value::List(vec![coerce(value, inner)?])),

        (TypeNode::Scalar(scalar), value) => coerce_scalar(value, *scalar),

        (TypeNode::Enum(enum_type), Json::String(key)) => enum_type.value_for(key).cloned().ok_or_else(|| {
            HandlerError::malformed(format!(
                "Value \"{key}\" does not exist in \"{}\" enum.",
                enum_type.name()
            ))
        }),
        (TypeNode::Enum(enum_type), value) => Err(HandlerError::malformed(format!(
            "Enum \"{}\" cannot represent non-enum value: {value}.",
            enum_type.name()
        ))),

        (TypeNode::Object(object), Json::Object(fields)) => {
            if let Some(unknown) = fields.keys().find(|name| object.find_field(name).is_none()) {
                return Err(HandlerError::malformed(format!(
                    "Field \"{unknown}\" is not defined by type \"{}\".",
                    object.name()
                )));
            }

            let mut coerced = ValueMap::with_capacity(fields.len());

            for (name, field_type) in object.fields() {
                match fields.get(name) {
                    Some(value) => {
                        coerced.insert(name.clone(), coerce(value, field_type)?);
                    }
                    None if field_type.is_required() => {
                        return Err(HandlerError::malformed(format!(
                            "Field \"{}.{name}\" of required type \"{field_type}\" was not provided.",
                            object.name()
                        )));
                    }
                    None => (),
                }
            }

            Ok(Value::Object(coerced))
        }
        (TypeNode::Object(object), value) => Err(HandlerError::malformed(format!(
            "Expected value of type \"{}\", found {value}.",
            object.name()
        ))),
    }
}

fn coerce_scalar(value: &Json, scalar: ScalarType) -> Result<Value> {
    let coerced = match (scalar, value) {
        (ScalarType::Boolean, Json::Bool(b)) => Some(Value::Boolean(*b)),
        (ScalarType::Int, Json::Number(n)) => n.as_i64().map(Value::Int),
        (ScalarType::Float, Json::Number(n)) => n.as_f64().map(Value::Float),
        (ScalarType::String, Json::String(s)) => Some(Value::String(s.clone())),
        // JSON travels as a serialized string, the way it is rendered.
        (ScalarType::Json, Json::String(s)) => serde_json::from_str(s).ok().map(Value::Json),
        (ScalarType::Json, other) => Some(Value::Json(other.clone())),
        (ScalarType::Decimal | ScalarType::Date | ScalarType::DateTime | ScalarType::Time, Json::Number(_) | Json::String(_)) => {
            Value::from_json(value.clone()).coerce(scalar.type_identifier()).ok()
        }
        _ => None,
    };

    coerced.ok_or_else(|| {
        let reason = match scalar {
            ScalarType::Boolean => "a non boolean value",
            ScalarType::Int => "non-integer value",
            ScalarType::Float => "non numeric value",
            ScalarType::String => "a non string value",
            _ => "value",
        };

        HandlerError::malformed(format!("{scalar} cannot represent {reason}: {value}"))
    })
}
