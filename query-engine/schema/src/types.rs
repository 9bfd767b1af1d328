use indexmap::IndexMap;
use query_structure::{TypeIdentifier, Value};
use std::{fmt, sync::Arc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarType {
    Boolean,
    Int,
    Float,
    Decimal,
    String,
    Date,
    DateTime,
    Time,
    Json,
}

impl ScalarType {
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Boolean => "Boolean",
            ScalarType::Int => "Int",
            ScalarType::Float => "Float",
            ScalarType::Decimal => "Decimal",
            ScalarType::String => "String",
            ScalarType::Date => "Date",
            ScalarType::DateTime => "DateTime",
            ScalarType::Time => "Time",
            ScalarType::Json => "JSON",
        }
    }

    /// Scalars that are not built into GraphQL and have to be declared.
    pub fn is_custom(&self) -> bool {
        !matches!(
            self,
            ScalarType::Boolean | ScalarType::Int | ScalarType::Float | ScalarType::String
        )
    }

    pub fn type_identifier(&self) -> TypeIdentifier {
        match self {
            ScalarType::Boolean => TypeIdentifier::Boolean,
            ScalarType::Int => TypeIdentifier::Int,
            ScalarType::Float => TypeIdentifier::Float,
            ScalarType::Decimal => TypeIdentifier::Decimal,
            ScalarType::String => TypeIdentifier::String,
            ScalarType::Date => TypeIdentifier::Date,
            ScalarType::DateTime => TypeIdentifier::DateTime,
            ScalarType::Time => TypeIdentifier::Time,
            ScalarType::Json => TypeIdentifier::Json,
        }
    }

    pub const CUSTOM: [ScalarType; 5] = [
        ScalarType::Decimal,
        ScalarType::Date,
        ScalarType::DateTime,
        ScalarType::Time,
        ScalarType::Json,
    ];
}

impl From<TypeIdentifier> for ScalarType {
    fn from(type_identifier: TypeIdentifier) -> Self {
        match type_identifier {
            TypeIdentifier::Boolean => ScalarType::Boolean,
            TypeIdentifier::Int => ScalarType::Int,
            TypeIdentifier::Float => ScalarType::Float,
            TypeIdentifier::Decimal => ScalarType::Decimal,
            TypeIdentifier::String => ScalarType::String,
            TypeIdentifier::Date => ScalarType::Date,
            TypeIdentifier::DateTime => ScalarType::DateTime,
            TypeIdentifier::Time => ScalarType::Time,
            TypeIdentifier::Json => ScalarType::Json,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    /// The GraphQL name of the value.
    pub key: String,
    /// What is stored.
    pub value: Value,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    name: String,
    values: Vec<EnumValue>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, values: Vec<EnumValue>) -> Self {
        EnumType {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[EnumValue] {
        &self.values
    }

    pub fn key_for(&self, value: &Value) -> Option<&str> {
        self.values
            .iter()
            .find(|candidate| &candidate.value == value)
            .map(|candidate| candidate.key.as_str())
    }

    pub fn value_for(&self, key: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|candidate| candidate.key == key)
            .map(|candidate| &candidate.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn suffix(&self) -> &'static str {
        match self {
            Direction::Input => "input_type",
            Direction::Output => "output_type",
        }
    }
}

/// A named object type. Input objects are used for arguments, output objects
/// for results.
#[derive(Debug, PartialEq)]
pub struct ObjectType {
    name: String,
    direction: Direction,
    fields: IndexMap<String, TypeNode>,
}

impl ObjectType {
    pub(crate) fn new(name: String, direction: Direction, fields: IndexMap<String, TypeNode>) -> Self {
        ObjectType {
            name,
            direction,
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn fields(&self) -> &IndexMap<String, TypeNode> {
        &self.fields
    }

    pub fn find_field(&self, name: &str) -> Option<&TypeNode> {
        self.fields.get(name)
    }
}

/// A node of the derived type graph. Object and enum types are shared
/// between every place they are referenced from.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeNode {
    Scalar(ScalarType),
    Enum(Arc<EnumType>),
    Object(Arc<ObjectType>),
    List(Box<TypeNode>),
    Required(Box<TypeNode>),
}

impl TypeNode {
    pub fn is_required(&self) -> bool {
        matches!(self, TypeNode::Required(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self.unwrap_required(), TypeNode::List(_))
    }

    /// The type without its non-null wrapper.
    pub fn unwrap_required(&self) -> &TypeNode {
        match self {
            TypeNode::Required(inner) => inner,
            other => other,
        }
    }

    /// The named type at the bottom of list and non-null wrappers.
    pub fn named(&self) -> &TypeNode {
        match self {
            TypeNode::List(inner) | TypeNode::Required(inner) => inner.named(),
            other => other,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<ObjectType>> {
        match self.named() {
            TypeNode::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&Arc<EnumType>> {
        match self.named() {
            TypeNode::Enum(enum_type) => Some(enum_type),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<ScalarType> {
        match self.named() {
            TypeNode::Scalar(scalar) => Some(*scalar),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.as_object().is_none()
    }

    /// Name of the underlying named type.
    pub fn name(&self) -> &str {
        match self {
            TypeNode::Scalar(scalar) => scalar.name(),
            TypeNode::Enum(enum_type) => enum_type.name(),
            TypeNode::Object(object) => object.name(),
            TypeNode::List(inner) | TypeNode::Required(inner) => inner.name(),
        }
    }
}

/// GraphQL type reference notation, e.g. `[String!]!`.
impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeNode::Scalar(scalar) => f.write_str(scalar.name()),
            TypeNode::Enum(enum_type) => f.write_str(enum_type.name()),
            TypeNode::Object(object) => f.write_str(object.name()),
            TypeNode::List(inner) => write!(f, "[{inner}]"),
            TypeNode::Required(inner) => write!(f, "{inner}!"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_references_render_like_graphql() {
        let node = TypeNode::Required(Box::new(TypeNode::List(Box::new(TypeNode::Required(Box::new(
            TypeNode::Scalar(ScalarType::Json),
        ))))));

        assert_eq!(node.to_string(), "[JSON!]!");
        assert!(node.is_list());
        assert_eq!(node.as_scalar(), Some(ScalarType::Json));
    }
}
