use query_structure::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{}", kind)]
pub struct ConnectorError {
    pub kind: ErrorKind,
}

impl ConnectorError {
    pub fn from_kind(kind: ErrorKind) -> Self {
        ConnectorError { kind }
    }

    pub fn query_error(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::from_kind(ErrorKind::QueryError(Box::new(err)))
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self.kind, ErrorKind::UniqueConstraintViolation { .. })
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self.kind, ErrorKind::ForeignKeyConstraintViolation)
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("Unique constraint failed on the fields: ({})", fields.join(", "))]
    UniqueConstraintViolation { fields: Vec<String> },

    #[error("Null constraint failed on the fields: ({})", fields.join(", "))]
    NullConstraintViolation { fields: Vec<String> },

    #[error("Foreign key constraint failed")]
    ForeignKeyConstraintViolation,

    #[error("Record does not exist.")]
    RecordDoesNotExist,

    #[error("Table '{}' does not exist.", table)]
    TableDoesNotExist { table: String },

    #[error("Column '{}' does not exist on table '{}'.", column, table)]
    ColumnDoesNotExist { table: String, column: String },

    #[error("Error querying the database: {}", _0)]
    QueryError(Box<dyn std::error::Error + Send + Sync>),

    #[error("The column value was different from the model: {}", _0)]
    ConversionError(String),

    #[error("Transaction error: {}", _0)]
    TransactionError(String),

    #[error("{}", _0)]
    DomainError(DomainError),
}

impl From<DomainError> for ConnectorError {
    fn from(err: DomainError) -> Self {
        ConnectorError::from_kind(ErrorKind::DomainError(err))
    }
}
