#![deny(unsafe_code)]

//! SQLite implementation of the storage interface.
//!
//! Statements are rendered as SQL text with positional parameters and run
//! through `rusqlite`. Each transaction holds the single connection for its
//! whole lifetime.

mod database;
mod error;
mod filter;
mod query_builder;
mod query_log;
mod row;
mod value;

pub use database::{Sqlite, SqliteTransaction};
pub use error::SqlError;
pub use query_log::QueryLog;

type Result<T> = std::result::Result<T, error::SqlError>;
