use query_structure::DomainError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model `{name}` is exposed twice")]
    DuplicateExposition { name: String },

    #[error("Custom field `{field}` collides with a field of model `{model}`")]
    CustomFieldCollision { model: String, field: String },

    #[error("Conflicting declarations for type `{name}`")]
    ConflictingType { name: String },

    #[error("`{name}` is not a valid GraphQL name")]
    InvalidName { name: String },

    #[error("Root field `{name}` is declared twice")]
    DuplicateRootField { name: String },

    #[error("No exposed model named `{name}`")]
    UnknownExposedModel { name: String },

    #[error("{0}")]
    Domain(#[from] DomainError),
}

impl SchemaError {
    pub fn configuration(message: impl Into<String>) -> Self {
        SchemaError::Configuration(message.into())
    }
}
