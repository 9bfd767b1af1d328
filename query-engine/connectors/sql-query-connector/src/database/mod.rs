mod functions;
mod operations;
mod sqlite;
mod transaction;

pub use sqlite::Sqlite;
pub use transaction::SqliteTransaction;
