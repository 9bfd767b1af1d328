use super::FieldNode;
use query_structure::Value;
use schema::{ScalarType, TypeNode};

type Json = serde_json::Value;

/// Renders a result tree for the client: keys are response keys, enum
/// values are shown by their keys, and custom scalars become strings.
pub(crate) fn shape(value: &Value, ty: &TypeNode, selection: &[FieldNode]) -> Json {
    match (ty.unwrap_required(), value) {
        (_, Value::Null) => Json::Null,

        (TypeNode::Scalar(ScalarType::Json), Value::Json(json)) => Json::String(json.to_string()),
        (TypeNode::Scalar(ScalarType::Json), other) => Json::String(other.to_json().to_string()),

        // Untyped results of user callables.
        (_, Value::Json(json)) => shape(&Value::from_json(json.clone()), ty, selection),

        (TypeNode::List(inner), Value::List(items)) => {
            Json::Array(items.iter().map(|item| shape(item, inner, selection)).collect())
        }
        (TypeNode::List(inner), other) => Json::Array(vec![shape(other, inner, selection)]),

        (TypeNode::Object(object), Value::Object(fields)) => {
            let mut shaped = serde_json::Map::with_capacity(selection.len());

            for field in selection {
                let value = if field.is_typename() {
                    Json::String(object.name().to_owned())
                } else {
                    match object.find_field(&field.name) {
                        Some(field_type) => shape(fields.get(&field.name).unwrap_or(&Value::Null), field_type, &field.selection),
                        None => Json::Null,
                    }
                };

                shaped.insert(field.response_key.clone(), value);
            }

            Json::Object(shaped)
        }
        (TypeNode::Object(_), _) => Json::Null,

        (TypeNode::Enum(enum_type), value) => match enum_type.key_for(value) {
            Some(key) => Json::String(key.to_owned()),
            None => value.to_json(),
        },

        (_, value) => value.to_json(),
    }
}
