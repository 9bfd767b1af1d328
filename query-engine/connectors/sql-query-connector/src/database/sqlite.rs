use super::{functions, operations, transaction::SqliteTransaction};
use crate::{error::SqlError, QueryLog};
use async_trait::async_trait;
use query_connector::{self as connector, Connector, Transaction};
use query_structure::{InternalDataModelExt, InternalDataModelRef};
use rusqlite::Connection;
use std::{collections::HashSet, path::Path, sync::Arc};
use tokio::sync::Mutex;

/// A single SQLite connection. Transactions take exclusive hold of it, so
/// concurrent requests are serialized.
pub struct Sqlite {
    connection: Arc<Mutex<Connection>>,
    query_log: QueryLog,
}

impl Sqlite {
    pub fn open_in_memory() -> connector::Result<Self> {
        let connection = Connection::open_in_memory().map_err(SqlError::from)?;
        Self::from_connection(connection)
    }

    pub fn open(path: impl AsRef<Path>) -> connector::Result<Self> {
        let connection = Connection::open(path).map_err(SqlError::from)?;
        Self::from_connection(connection)
    }

    /// Enables foreign key enforcement and registers the functions filters
    /// are rendered with.
    pub fn from_connection(connection: Connection) -> connector::Result<Self> {
        connection
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(SqlError::from)?;

        functions::register(&connection).map_err(SqlError::from)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
            query_log: QueryLog::default(),
        })
    }

    pub fn query_log(&self) -> &QueryLog {
        &self.query_log
    }

    /// Starts capturing every executed statement, dropping earlier entries.
    pub fn enable_query_log(&self) {
        self.query_log.clear();
        self.query_log.enable();
    }

    /// Runs statements outside of any transaction, e.g. to create tables.
    pub async fn execute_raw(&self, sql: &str) -> connector::Result<()> {
        let connection = self.connection.lock().await;
        operations::execute_batch(&connection, &self.query_log, sql)?;

        Ok(())
    }

    /// Checks that every model has a table holding a column for each of its
    /// scalar fields.
    pub async fn verify_data_model(&self, dm: &InternalDataModelRef) -> connector::Result<()> {
        let connection = self.connection.lock().await;

        for model in dm.models() {
            let columns = table_columns(&connection, model.db_name())?;

            if columns.is_empty() {
                return Err(SqlError::TableDoesNotExist {
                    table: model.db_name().to_owned(),
                }
                .into());
            }

            for field in model.scalar_fields() {
                let Some(data) = field.as_scalar() else { continue };

                if !columns.contains(&data.db_name) {
                    return Err(SqlError::ColumnDoesNotExist {
                        table: model.db_name().to_owned(),
                        column: data.db_name.clone(),
                    }
                    .into());
                }
            }
        }

        tracing::debug!(models = dm.models().len(), "data model matches the database");

        Ok(())
    }
}

fn table_columns(connection: &Connection, table: &str) -> crate::Result<HashSet<String>> {
    let mut statement = connection.prepare("SELECT name FROM pragma_table_info(?)")?;
    let columns = statement
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;

    Ok(columns)
}

#[async_trait]
impl Connector for Sqlite {
    async fn start_transaction(&self) -> connector::Result<Box<dyn Transaction>> {
        let connection = self.connection.clone().lock_owned().await;
        let transaction = SqliteTransaction::begin(connection, self.query_log.clone())?;

        Ok(Box::new(transaction))
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
