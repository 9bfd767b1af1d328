use crate::protocols::graphql::classify;
use query_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{}", _0)]
    Core(#[from] CoreError),

    /// The document could not be parsed or does not fit the schema. The
    /// message follows the wording of the reference GraphQL implementation,
    /// which is what clients match on.
    #[error("{}", _0)]
    Malformed(String),

    #[error("Unsupported feature: {}. {}", feature_name, message)]
    UnsupportedFeature {
        feature_name: &'static str,
        message: String,
    },
}

impl HandlerError {
    pub fn malformed(message: impl ToString) -> Self {
        Self::Malformed(message.to_string())
    }

    pub fn unsupported_feature(feature_name: &'static str, message: impl ToString) -> Self {
        let message = message.to_string();

        Self::UnsupportedFeature { feature_name, message }
    }
}

impl From<HandlerError> for user_facing_errors::Error {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::Core(err) => err.into(),
            HandlerError::Malformed(message) => user_facing_errors::Error::new_known(classify(&message)),
            err @ HandlerError::UnsupportedFeature { .. } => {
                user_facing_errors::Error::new_known(classify(&err.to_string()))
            }
        }
    }
}

impl From<graphql_parser::query::ParseError> for HandlerError {
    fn from(err: graphql_parser::query::ParseError) -> Self {
        let details = err.to_string();
        let details = details.trim().trim_start_matches("query parse error:").trim();

        Self::malformed(format!("Syntax Error: {details}"))
    }
}
