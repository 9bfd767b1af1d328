use crate::HandlerError;
use serde::Serialize;
use user_facing_errors::{ErrorKind, KnownError, Path};

#[derive(Debug, Serialize, Default, PartialEq)]
pub struct GQLResponse {
    /// `null` when the request could not be executed at all, otherwise one
    /// entry per root field response key.
    pub data: serde_json::Value,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GQLError>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct GQLError {
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,

    pub kind: ErrorKind,

    pub payload: serde_json::Value,
}

impl GQLError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Strips internal details from unknown failures unless `debug` is set.
    pub fn from_user_facing_error(err: user_facing_errors::Error, path: Option<Path>, debug: bool) -> Self {
        let KnownError { kind, message, payload } = err.into_known(debug);

        GQLError {
            message,
            path,
            kind,
            payload,
        }
    }

    pub fn from_handler_error(err: HandlerError, path: Option<Path>, debug: bool) -> Self {
        Self::from_user_facing_error(err.into(), path, debug)
    }

    pub fn from_panic_payload(
        panic_payload: Box<dyn std::any::Any + Send + 'static>,
        path: Option<Path>,
        debug: bool,
    ) -> Self {
        Self::from_user_facing_error(user_facing_errors::Error::from_panic_payload(panic_payload), path, debug)
    }
}

impl GQLResponse {
    pub fn new(data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            data: serde_json::Value::Object(data),
            ..Default::default()
        }
    }

    /// A response for a request that was rejected before any execution.
    pub fn rejected(errors: Vec<GQLError>) -> Self {
        Self {
            data: serde_json::Value::Null,
            errors,
        }
    }

    pub fn insert_error(&mut self, error: GQLError) {
        self.errors.push(error);
    }

    pub fn errors(&self) -> impl Iterator<Item = &GQLError> {
        self.errors.iter()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_data(self) -> serde_json::Value {
        self.data
    }
}
