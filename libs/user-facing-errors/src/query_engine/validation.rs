use crate::{ErrorKind, UserFacingError};
use serde::Serialize;

/// The machine-readable reason of a request that could not be understood.
/// Classification happens on the message text, so `Unknown` is always a
/// possible outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MalformedRequestKind {
    SyntaxError,
    MissingArgument,
    UnknownArgument,
    UnknownField,
    WrongType,
    MissingSubselection,
    UnexpectedSubselection,
    UnknownOperation,
    MissingVariable,
    Unknown,
}

#[derive(Debug, Serialize)]
pub struct MalformedRequest {
    pub reason: MalformedRequestKind,

    #[serde(skip)]
    pub message: String,

    /// Values extracted from the message, e.g. `expected_argument_name`.
    #[serde(flatten)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl MalformedRequest {
    pub fn new(reason: MalformedRequestKind, message: impl Into<String>) -> Self {
        MalformedRequest {
            reason,
            message: message.into(),
            meta: Default::default(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.meta.insert(key.to_owned(), value.into());
        self
    }
}

impl UserFacingError for MalformedRequest {
    const KIND: ErrorKind = ErrorKind::MalformedRequest;

    fn message(&self) -> String {
        self.message.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KnownError;
    use serde_json::json;

    #[test]
    fn meta_is_flattened_next_to_the_reason() {
        let err = KnownError::new(
            MalformedRequest::new(MalformedRequestKind::MissingArgument, "missing")
                .with_meta("expected_argument_name", "username"),
        );

        assert_eq!(err.kind, ErrorKind::MalformedRequest);
        assert_eq!(
            err.payload,
            json!({ "reason": "MISSING_ARGUMENT", "expected_argument_name": "username" })
        );
    }
}
