#![deny(rust_2018_idioms, unsafe_code)]

//! The GraphQL entry point of the engine: parses a request, validates it
//! against the query schema, runs every root field through the executor and
//! shapes the results into a `{ data, errors }` response.

mod error;
mod handler;
mod response;

pub mod protocols;

pub use error::HandlerError;
pub use handler::*;
pub use protocols::graphql::{render_graphql_schema, GraphqlBody};
pub use response::*;

pub type Result<T> = std::result::Result<T, HandlerError>;
