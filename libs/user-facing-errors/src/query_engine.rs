mod validation;

pub use validation::*;

use crate::{ErrorKind, Path, UserFacingError};
use serde::Serialize;

#[derive(Debug, Serialize, Default)]
pub struct Unauthenticated {}

impl UserFacingError for Unauthenticated {
    const KIND: ErrorKind = ErrorKind::Unauthenticated;

    fn message(&self) -> String {
        "Authentication is required to perform this operation".to_owned()
    }
}

#[derive(Debug, Serialize)]
pub struct Forbidden {
    /// `CREATE`, `READ`, `UPDATE` or `DELETE`.
    pub operation: String,

    /// Display form of the caller, `None` when anonymous.
    pub authenticated_user: String,

    pub path: Path,
}

impl UserFacingError for Forbidden {
    const KIND: ErrorKind = ErrorKind::Forbidden;

    fn message(&self) -> String {
        format!(
            "User `{}` is not allowed to perform {} at `{}`",
            self.authenticated_user,
            self.operation,
            join_path(&self.path)
        )
    }
}

#[derive(Debug, Serialize)]
pub struct NotFound {
    /// The arguments that matched nothing.
    pub filters: serde_json::Value,
}

impl UserFacingError for NotFound {
    const KIND: ErrorKind = ErrorKind::NotFound;

    fn message(&self) -> String {
        format!("No record matches the filters {}", self.filters)
    }
}

/// A single field-level problem. The `code` is stable and meant for machines.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub path: Path,
    pub message: String,
    pub params: serde_json::Map<String, serde_json::Value>,
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct Validation {
    pub issues: Vec<ValidationIssue>,
}

impl UserFacingError for Validation {
    const KIND: ErrorKind = ErrorKind::Validation;

    fn message(&self) -> String {
        let messages: Vec<String> = self
            .issues
            .iter()
            .map(|issue| format!("{}: {}", join_path(&issue.path), issue.message))
            .collect();

        format!("Validation failed: {}", messages.join("; "))
    }
}

#[derive(Debug, Serialize)]
pub struct Duplicate {
    pub path: Path,
}

impl UserFacingError for Duplicate {
    const KIND: ErrorKind = ErrorKind::Duplicate;

    fn message(&self) -> String {
        format!("A record with the same unique values already exists at `{}`", join_path(&self.path))
    }
}

#[derive(Debug, Serialize)]
pub struct Integrity {
    pub path: Path,
}

impl UserFacingError for Integrity {
    const KIND: ErrorKind = ErrorKind::Integrity;

    fn message(&self) -> String {
        format!(
            "The record at `{}` cannot be removed while other records depend on it",
            join_path(&self.path)
        )
    }
}

#[derive(Debug, Serialize)]
pub struct Internal {
    pub details: Option<String>,
}

impl UserFacingError for Internal {
    const KIND: ErrorKind = ErrorKind::Internal;

    fn message(&self) -> String {
        match &self.details {
            Some(details) => format!("Internal error: {details}"),
            None => "Internal error".to_owned(),
        }
    }
}

fn join_path(path: &Path) -> String {
    path.iter().map(ToString::to_string).collect::<Vec<_>>().join(".")
}
