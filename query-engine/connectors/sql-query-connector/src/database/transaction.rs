use super::operations;
use crate::{error::SqlError, QueryLog};
use async_trait::async_trait;
use query_connector::{self as connector, ReadOperations, ReadPlan, Transaction, WriteArgs, WriteOperations};
use query_structure::{Filter, Model, Record, Value};
use rusqlite::Connection;
use tokio::sync::OwnedMutexGuard;

/// An open transaction on the shared connection. Dropping it without
/// committing rolls back.
pub struct SqliteTransaction {
    connection: OwnedMutexGuard<Connection>,
    query_log: QueryLog,
    open: bool,
}

impl SqliteTransaction {
    pub(crate) fn begin(connection: OwnedMutexGuard<Connection>, query_log: QueryLog) -> connector::Result<Self> {
        operations::execute_batch(&connection, &query_log, "BEGIN")?;

        Ok(Self {
            connection,
            query_log,
            open: true,
        })
    }

    fn catch<O>(&self, f: impl FnOnce(&Connection, &QueryLog) -> Result<O, SqlError>) -> connector::Result<O> {
        if !self.open {
            return Err(SqlError::TransactionError("the transaction is already closed".into()).into());
        }

        f(&*self.connection, &self.query_log).map_err(SqlError::into_connector_error)
    }

    fn finish(&mut self, statement: &str) -> connector::Result<()> {
        let result = self.catch(|conn, log| operations::execute_batch(conn, log, statement));
        self.open = false;

        result
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if self.open {
            if let Err(err) = operations::execute_batch(&self.connection, &self.query_log, "ROLLBACK") {
                tracing::error!(error = %err, "failed to roll back an abandoned transaction");
            }
        }
    }
}

#[async_trait]
impl Transaction for SqliteTransaction {
    async fn commit(&mut self) -> connector::Result<()> {
        self.finish("COMMIT")
    }

    async fn rollback(&mut self) -> connector::Result<()> {
        self.finish("ROLLBACK")
    }
}

#[async_trait]
impl ReadOperations for SqliteTransaction {
    async fn get_many_records(
        &mut self,
        model: &Model,
        plan: &ReadPlan,
        filter: &Filter,
    ) -> connector::Result<Vec<Record>> {
        self.catch(|conn, log| operations::get_many_records(conn, log, model, plan, filter))
    }

    async fn count_records(&mut self, model: &Model, filter: &Filter) -> connector::Result<usize> {
        self.catch(|conn, log| operations::count_records(conn, log, model, filter))
    }
}

#[async_trait]
impl WriteOperations for SqliteTransaction {
    async fn create_record(&mut self, model: &Model, args: WriteArgs) -> connector::Result<Value> {
        self.catch(|conn, log| operations::create_record(conn, log, model, args))
    }

    async fn update_record(&mut self, model: &Model, id: &Value, args: WriteArgs) -> connector::Result<usize> {
        self.catch(|conn, log| operations::update_record(conn, log, model, id, args))
    }

    async fn delete_record(&mut self, model: &Model, id: &Value) -> connector::Result<usize> {
        self.catch(|conn, log| operations::delete_record(conn, log, model, id))
    }
}
