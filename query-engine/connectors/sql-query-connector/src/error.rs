use query_connector::error::{ConnectorError, ErrorKind};
use query_structure::DomainError;
use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlError {
    #[error("Unique constraint failed: {:?}", fields)]
    UniqueConstraintViolation { fields: Vec<String> },

    #[error("Null constraint failed: {:?}", fields)]
    NullConstraintViolation { fields: Vec<String> },

    #[error("Foreign key constraint failed")]
    ForeignKeyConstraintViolation,

    #[error("Table {} does not exist", table)]
    TableDoesNotExist { table: String },

    #[error("Column {} does not exist on table {}", column, table)]
    ColumnDoesNotExist { table: String, column: String },

    #[error("Conversion error: {0}")]
    ConversionError(String),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Error querying the database: {0}")]
    QueryError(rusqlite::Error),

    #[error("{0}")]
    DomainError(#[from] DomainError),
}

impl SqlError {
    pub(crate) fn into_connector_error(self) -> ConnectorError {
        let kind = match self {
            SqlError::UniqueConstraintViolation { fields } => ErrorKind::UniqueConstraintViolation { fields },
            SqlError::NullConstraintViolation { fields } => ErrorKind::NullConstraintViolation { fields },
            SqlError::ForeignKeyConstraintViolation => ErrorKind::ForeignKeyConstraintViolation,
            SqlError::TableDoesNotExist { table } => ErrorKind::TableDoesNotExist { table },
            SqlError::ColumnDoesNotExist { table, column } => ErrorKind::ColumnDoesNotExist { table, column },
            SqlError::ConversionError(message) => ErrorKind::ConversionError(message),
            SqlError::TransactionError(message) => ErrorKind::TransactionError(message),
            SqlError::QueryError(err) => ErrorKind::QueryError(Box::new(err)),
            SqlError::DomainError(err) => ErrorKind::DomainError(err),
        };

        ConnectorError::from_kind(kind)
    }
}

impl From<SqlError> for ConnectorError {
    fn from(err: SqlError) -> Self {
        err.into_connector_error()
    }
}

/// Column names out of messages like `UNIQUE constraint failed: person.name, person.age`.
fn constraint_fields(description: &str) -> Vec<String> {
    description
        .split(": ")
        .nth(1)
        .map(|columns| {
            columns
                .split(", ")
                .filter_map(|column| column.split('.').last())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

impl From<rusqlite::Error> for SqlError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(
                ffi::Error {
                    extended_code: ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
                    ..
                },
                Some(ref description),
            ) => SqlError::UniqueConstraintViolation {
                fields: constraint_fields(description),
            },

            rusqlite::Error::SqliteFailure(
                ffi::Error {
                    extended_code: ffi::SQLITE_CONSTRAINT_NOTNULL,
                    ..
                },
                Some(ref description),
            ) => SqlError::NullConstraintViolation {
                fields: constraint_fields(description),
            },

            rusqlite::Error::SqliteFailure(
                ffi::Error {
                    extended_code: ffi::SQLITE_CONSTRAINT_FOREIGNKEY | ffi::SQLITE_CONSTRAINT_TRIGGER,
                    ..
                },
                _,
            ) => SqlError::ForeignKeyConstraintViolation,

            rusqlite::Error::SqliteFailure(_, Some(ref description)) if description.starts_with("no such table") => {
                SqlError::TableDoesNotExist {
                    table: description.split(": ").last().unwrap_or_default().to_owned(),
                }
            }

            rusqlite::Error::SqliteFailure(_, Some(ref description)) if description.contains("has no column named") => {
                let mut words = description.split(' ');

                SqlError::ColumnDoesNotExist {
                    table: words.nth(1).unwrap_or_default().to_owned(),
                    column: words.last().unwrap_or_default().to_owned(),
                }
            }

            rusqlite::Error::FromSqlConversionFailure(_, _, cause) => SqlError::ConversionError(cause.to_string()),
            rusqlite::Error::InvalidColumnType(_, column, ty) => {
                SqlError::ConversionError(format!("column {column} holds an unexpected {ty}"))
            }

            err => SqlError::QueryError(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_messages_are_split_into_columns() {
        assert_eq!(
            constraint_fields("UNIQUE constraint failed: person.name, person.age"),
            vec!["name".to_owned(), "age".to_owned()]
        );
        assert!(constraint_fields("garbage").is_empty());
    }
}
