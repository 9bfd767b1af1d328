#![deny(rust_2018_idioms, unsafe_code)]

//! Errors surfaced to API clients.
//!
//! Every error that leaves the engine is either a [KnownError], carrying one
//! of the [ErrorKind] tags and a structured payload, or an unknown internal
//! failure. Both serialize to the same wire shape:
//!
//! ```json
//! { "kind": "NOT_FOUND", "payload": { "filters": { "id": 4 } } }
//! ```

pub mod query_engine;

use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};

pub trait UserFacingError: Serialize {
    const KIND: ErrorKind;

    fn message(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Unauthenticated,
    Forbidden,
    NotFound,
    Validation,
    Duplicate,
    Integrity,
    Internal,
    MalformedRequest,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "UNAUTHENTICATED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Duplicate => "DUPLICATE",
            ErrorKind::Integrity => "INTEGRITY",
            ErrorKind::Internal => "INTERNAL",
            ErrorKind::MalformedRequest => "MALFORMED_REQUEST",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One step of the location of an error inside a response: a field name or a
/// list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{index}"),
        }
    }
}

pub type Path = Vec<PathSegment>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnownError {
    pub kind: ErrorKind,
    #[serde(skip)]
    pub message: String,
    pub payload: serde_json::Value,
}

impl KnownError {
    pub fn new<T: UserFacingError>(inner: T) -> KnownError {
        let message = inner.message();
        let payload = match serde_json::to_value(&inner) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!("Failed to serialize a user facing error payload: {err}");
                serde_json::Value::Object(Default::default())
            }
        };

        KnownError {
            kind: T::KIND,
            message,
            payload,
        }
    }
}

impl fmt::Display for KnownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for KnownError {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnknownError {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    inner: ErrorType,
}

#[derive(Debug, Clone, PartialEq)]
enum ErrorType {
    Known(KnownError),
    Unknown(UnknownError),
}

#[derive(Serialize)]
struct WireError<'a> {
    kind: ErrorKind,
    payload: Cow<'a, serde_json::Value>,
}

impl Serialize for Error {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match &self.inner {
            ErrorType::Known(err) => WireError {
                kind: err.kind,
                payload: Cow::Borrowed(&err.payload),
            },
            ErrorType::Unknown(err) => WireError {
                kind: ErrorKind::Internal,
                payload: Cow::Owned(serde_json::json!({ "details": err.message })),
            },
        };

        wire.serialize(serializer)
    }
}

impl Error {
    pub fn new_known<T: UserFacingError>(inner: T) -> Self {
        KnownError::new(inner).into()
    }

    /// Wraps any error that was not anticipated as an internal failure.
    pub fn from_dyn_error(err: &(dyn std::error::Error + Send + Sync + 'static)) -> Self {
        Error {
            inner: ErrorType::Unknown(UnknownError {
                message: err.to_string(),
            }),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Error {
            inner: ErrorType::Unknown(UnknownError {
                message: message.into(),
            }),
        }
    }

    /// Builds an internal error from the payload of a caught panic.
    pub fn from_panic_payload(panic_payload: Box<dyn std::any::Any + Send + 'static>) -> Self {
        let message = panic_payload
            .downcast_ref::<&str>()
            .map(|s| -> String { (*s).to_owned() })
            .or_else(|| panic_payload.downcast_ref::<String>().map(|s| s.to_owned()))
            .unwrap_or_else(|| "<unknown panic>".to_owned());

        Error::unknown(message)
    }

    pub fn kind(&self) -> ErrorKind {
        match &self.inner {
            ErrorType::Known(err) => err.kind,
            ErrorType::Unknown(_) => ErrorKind::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match &self.inner {
            ErrorType::Known(err) => &err.message,
            ErrorType::Unknown(err) => &err.message,
        }
    }

    pub fn as_known(&self) -> Option<&KnownError> {
        match &self.inner {
            ErrorType::Known(err) => Some(err),
            ErrorType::Unknown(_) => None,
        }
    }

    /// Turns the error into its client-visible form. Internal failures only
    /// keep their details in debug mode.
    pub fn into_known(self, debug: bool) -> KnownError {
        match self.inner {
            ErrorType::Known(err) if err.kind == ErrorKind::Internal && !debug => {
                KnownError::new(query_engine::Internal { details: None })
            }
            ErrorType::Known(err) => err,
            ErrorType::Unknown(err) => KnownError::new(query_engine::Internal {
                details: debug.then_some(err.message),
            }),
        }
    }
}

impl From<KnownError> for Error {
    fn from(known_error: KnownError) -> Self {
        Error {
            inner: ErrorType::Known(known_error),
        }
    }
}

impl From<UnknownError> for Error {
    fn from(unknown_error: UnknownError) -> Self {
        Error {
            inner: ErrorType::Unknown(unknown_error),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn known_errors_serialize_as_kind_and_payload() {
        let err = Error::new_known(query_engine::Duplicate {
            path: vec!["mutation".into(), "create_person".into(), "username".into()],
        });

        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "kind": "DUPLICATE",
                "payload": { "path": ["mutation", "create_person", "username"] }
            })
        );
    }

    #[test]
    fn internal_details_are_stripped_outside_debug_mode() {
        let err = Error::unknown("no such table: person");

        let stripped = err.clone().into_known(false);
        assert_eq!(stripped.kind, ErrorKind::Internal);
        assert_eq!(stripped.payload, json!({ "details": null }));

        let kept = err.into_known(true);
        assert_eq!(kept.payload, json!({ "details": "no such table: person" }));
    }

    #[test]
    fn panic_payloads_become_internal_errors() {
        let err = Error::from_panic_payload(Box::new("boom"));

        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.message(), "boom");
    }
}
