use query_connector::error::ConnectorError;
use query_structure::{DomainError, Operation, Value, ValueMap};
use thiserror::Error;
use user_facing_errors::{
    query_engine::{self as errors, MalformedRequest, MalformedRequestKind, ValidationIssue},
    KnownError, Path,
};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Error in connector: {}", _0)]
    ConnectorError(#[from] ConnectorError),

    #[error("Failed to write at {}: {}", display_path(path), source)]
    WriteError { path: Path, source: ConnectorError },

    #[error("Error in domain logic: {}", _0)]
    DomainError(#[from] DomainError),

    #[error("Authentication is required")]
    Unauthenticated,

    #[error("{} is not allowed for {} at {}", operation, user.as_deref().unwrap_or("anonymous users"), display_path(path))]
    Forbidden {
        operation: Operation,
        user: Option<String>,
        path: Path,
    },

    #[error("No record matches {}", Value::Object(filters.clone()))]
    NotFound { filters: ValueMap },

    #[error("Validation failed with {} issue(s)", _0.len())]
    Validation(Vec<ValidationIssue>),

    #[error("Expected a single `{}` record, found {}", model, count)]
    MultipleRecords { model: String, count: usize },

    #[error("Unknown argument `{}` for `{}`", argument, model)]
    UnknownArgument { model: String, argument: String },

    #[error("Invalid value for `{}`: {}", argument, reason)]
    InvalidArgument { argument: String, reason: String },

    #[error("{}", _0)]
    ConfigurationError(String),

    #[error("{:#}", _0)]
    Callback(#[from] anyhow::Error),
}

impl CoreError {
    /// Attaches the operation path to a failed storage write, so constraint
    /// violations can name the offending record.
    pub fn write_error(path: &Path) -> impl FnOnce(ConnectorError) -> CoreError + '_ {
        move |source| CoreError::WriteError {
            path: path.clone(),
            source,
        }
    }

    pub fn forbidden(operation: Operation, user: Option<&query_structure::AuthenticatedUser>, path: &Path) -> Self {
        CoreError::Forbidden {
            operation,
            user: user.map(ToString::to_string),
            path: path.clone(),
        }
    }
}

impl From<CoreError> for user_facing_errors::Error {
    fn from(err: CoreError) -> user_facing_errors::Error {
        match err {
            CoreError::Unauthenticated => user_facing_errors::Error::new_known(errors::Unauthenticated {}),

            CoreError::Forbidden { operation, user, path } => {
                user_facing_errors::Error::new_known(errors::Forbidden {
                    operation: operation.as_str().to_owned(),
                    authenticated_user: user.unwrap_or_else(|| "None".to_owned()),
                    path,
                })
            }

            CoreError::NotFound { filters } => user_facing_errors::Error::new_known(errors::NotFound {
                filters: Value::Object(filters).to_json(),
            }),

            CoreError::Validation(issues) => user_facing_errors::Error::new_known(errors::Validation { issues }),

            CoreError::WriteError { path, source } if source.is_unique_violation() => {
                user_facing_errors::Error::new_known(errors::Duplicate { path })
            }

            CoreError::WriteError { path, source } if source.is_foreign_key_violation() => {
                user_facing_errors::Error::new_known(errors::Integrity { path })
            }

            CoreError::UnknownArgument { model, argument } => user_facing_errors::Error::new_known(
                MalformedRequest::new(
                    MalformedRequestKind::UnknownArgument,
                    format!("Unknown argument \"{argument}\" on \"{model}\"."),
                )
                .with_meta("argument_name", argument),
            ),

            CoreError::InvalidArgument { argument, reason } => user_facing_errors::Error::new_known(
                MalformedRequest::new(
                    MalformedRequestKind::WrongType,
                    format!("Argument \"{argument}\" has invalid value: {reason}"),
                )
                .with_meta("argument_name", argument),
            ),

            // User callables may fail with a known error on purpose.
            CoreError::Callback(err) => match err.downcast::<KnownError>() {
                Ok(known) => known.into(),
                Err(err) => match err.downcast::<CoreError>() {
                    Ok(core) => core.into(),
                    Err(err) => user_facing_errors::Error::unknown(format!("{err:#}")),
                },
            },

            err => user_facing_errors::Error::from_dyn_error(&err),
        }
    }
}

fn display_path(path: &Path) -> String {
    path.iter().map(ToString::to_string).collect::<Vec<_>>().join(".")
}

/// A validation issue on `field`, located below `path`.
pub(crate) fn issue(
    path: &Path,
    field: &str,
    code: &str,
    message: impl Into<String>,
    params: serde_json::Map<String, serde_json::Value>,
) -> ValidationIssue {
    let mut path = path.clone();
    path.push(field.into());

    ValidationIssue {
        path,
        message: message.into(),
        params,
        code: code.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use query_connector::error::ErrorKind;
    use serde_json::json;
    use user_facing_errors::ErrorKind as UserErrorKind;

    #[test]
    fn constraint_violations_keep_their_path() {
        let path: Path = vec!["create_person".into(), "home".into()];
        let unique = ConnectorError::from_kind(ErrorKind::UniqueConstraintViolation {
            fields: vec!["name".into()],
        });

        let err: user_facing_errors::Error = CoreError::write_error(&path)(unique).into();

        assert_eq!(err.kind(), UserErrorKind::Duplicate);
        assert_eq!(
            err.as_known().unwrap().payload,
            json!({ "path": ["create_person", "home"] })
        );

        let fk = ConnectorError::from_kind(ErrorKind::ForeignKeyConstraintViolation);
        let err: user_facing_errors::Error = CoreError::write_error(&path)(fk).into();
        assert_eq!(err.kind(), UserErrorKind::Integrity);
    }

    #[test]
    fn known_errors_raised_by_callbacks_pass_through() {
        let known = KnownError::new(errors::Forbidden {
            operation: "UPDATE".into(),
            authenticated_user: "alice".into(),
            path: vec!["update_person".into()],
        });

        let err: user_facing_errors::Error = CoreError::Callback(anyhow::Error::new(known.clone())).into();
        assert_eq!(err.as_known(), Some(&known));

        let err: user_facing_errors::Error = CoreError::Callback(anyhow::anyhow!("boom")).into();
        assert_eq!(err.kind(), UserErrorKind::Internal);
        assert_eq!(err.message(), "boom");
    }

    #[test]
    fn forbidden_names_the_operation_and_the_caller() {
        let err: user_facing_errors::Error = CoreError::Forbidden {
            operation: Operation::Create,
            user: None,
            path: vec!["create_person".into()],
        }
        .into();

        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "kind": "FORBIDDEN",
                "payload": {
                    "operation": "CREATE",
                    "authenticated_user": "None",
                    "path": ["create_person"],
                }
            })
        );
    }
}
