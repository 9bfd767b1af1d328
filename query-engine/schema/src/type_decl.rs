use crate::ScalarType;
use indexmap::IndexMap;
use query_structure::{Operation, Value};

/// Ordered field name to type declaration mapping.
pub type TypeMapping = IndexMap<String, TypeDecl>;

/// A type as declared by the type graph builder or by the author of an
/// exposed query or mutation. Declarations are turned into shared, named
/// [TypeNode](crate::TypeNode)s when the schema is built.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDecl {
    Scalar(ScalarType),
    Enum(EnumDecl),
    List(Box<TypeDecl>),
    Required(Box<TypeDecl>),
    Object(TypeMapping),
    Model(ModelTypeDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub values: Vec<EnumValueDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDecl {
    pub key: String,
    pub value: Value,
    pub description: Option<String>,
}

/// Reuses the type of an exposed model for an operation, optionally with
/// fields removed or added.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTypeDecl {
    /// Exposed name of the model.
    pub model: String,
    pub operation: Operation,
    pub exclude: Vec<String>,
    pub additional: TypeMapping,
}

impl ModelTypeDecl {
    pub fn new(model: impl Into<String>, operation: Operation) -> Self {
        ModelTypeDecl {
            model: model.into(),
            operation,
            exclude: Vec::new(),
            additional: TypeMapping::new(),
        }
    }

    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn add(mut self, name: impl Into<String>, decl: impl Into<TypeDecl>) -> Self {
        self.additional.insert(name.into(), decl.into());
        self
    }

    pub fn is_modified(&self) -> bool {
        !self.exclude.is_empty() || !self.additional.is_empty()
    }
}

impl From<ModelTypeDecl> for TypeDecl {
    fn from(decl: ModelTypeDecl) -> Self {
        TypeDecl::Model(decl)
    }
}

impl From<ScalarType> for TypeDecl {
    fn from(scalar: ScalarType) -> Self {
        TypeDecl::Scalar(scalar)
    }
}

impl From<EnumDecl> for TypeDecl {
    fn from(decl: EnumDecl) -> Self {
        TypeDecl::Enum(decl)
    }
}

impl From<TypeMapping> for TypeDecl {
    fn from(mapping: TypeMapping) -> Self {
        TypeDecl::Object(mapping)
    }
}

impl TypeDecl {
    pub fn boolean() -> Self {
        TypeDecl::Scalar(ScalarType::Boolean)
    }

    pub fn int() -> Self {
        TypeDecl::Scalar(ScalarType::Int)
    }

    pub fn float() -> Self {
        TypeDecl::Scalar(ScalarType::Float)
    }

    pub fn decimal() -> Self {
        TypeDecl::Scalar(ScalarType::Decimal)
    }

    pub fn string() -> Self {
        TypeDecl::Scalar(ScalarType::String)
    }

    pub fn date() -> Self {
        TypeDecl::Scalar(ScalarType::Date)
    }

    pub fn datetime() -> Self {
        TypeDecl::Scalar(ScalarType::DateTime)
    }

    pub fn time() -> Self {
        TypeDecl::Scalar(ScalarType::Time)
    }

    pub fn json() -> Self {
        TypeDecl::Scalar(ScalarType::Json)
    }

    pub fn list(inner: impl Into<TypeDecl>) -> Self {
        TypeDecl::List(Box::new(inner.into()))
    }

    /// Wraps the declaration as non-null. Wrapping twice has no effect.
    pub fn required(inner: impl Into<TypeDecl>) -> Self {
        match inner.into() {
            required @ TypeDecl::Required(_) => required,
            other => TypeDecl::Required(Box::new(other)),
        }
    }

    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, TypeDecl)>,
        S: Into<String>,
    {
        TypeDecl::Object(fields.into_iter().map(|(name, decl)| (name.into(), decl)).collect())
    }

    pub fn model(model: impl Into<String>, operation: Operation) -> Self {
        TypeDecl::Model(ModelTypeDecl::new(model, operation))
    }

    pub fn is_required(&self) -> bool {
        matches!(self, TypeDecl::Required(_))
    }

    pub fn unwrap_required(&self) -> &TypeDecl {
        match self {
            TypeDecl::Required(inner) => inner,
            other => other,
        }
    }

    /// The object mapping of a linked field, looking through list and
    /// non-null wrappers.
    pub fn as_object(&self) -> Option<&TypeMapping> {
        match self {
            TypeDecl::Object(mapping) => Some(mapping),
            TypeDecl::List(inner) | TypeDecl::Required(inner) => inner.as_object(),
            _ => None,
        }
    }
}
