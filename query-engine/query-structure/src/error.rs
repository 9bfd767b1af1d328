use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Model `{}` not found", name)]
    ModelNotFound { name: String },

    #[error("Field `{}` on model `{}` not found", field, model)]
    FieldNotFound { model: String, field: String },

    #[error("Model `{}` declares the field `{}` more than once", model, field)]
    DuplicateField { model: String, field: String },

    #[error("Model `{}` is declared more than once", name)]
    DuplicateModel { name: String },

    #[error("Model `{}` must have exactly one primary key, found {}", model, count)]
    InvalidPrimaryKey { model: String, count: usize },

    #[error("Foreign key `{}.{}` points to the model `{}` which does not exist", model, field, target)]
    DanglingForeignKey {
        model: String,
        field: String,
        target: String,
    },

    #[error("Conversion from `{}` to `{}` failed.", from, to)]
    ConversionFailure { from: String, to: String },
}

impl DomainError {
    pub fn conversion(from: impl Into<String>, to: impl Into<String>) -> Self {
        DomainError::ConversionFailure {
            from: from.into(),
            to: to.into(),
        }
    }
}
