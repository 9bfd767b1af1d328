use crate::{ReadPlan, WriteArgs};
use async_trait::async_trait;
use query_structure::{Filter, Model, Record, Value};

#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a transaction. Every request runs inside exactly one of them;
    /// nested operations share it.
    async fn start_transaction(&self) -> crate::Result<Box<dyn Transaction>>;

    /// Returns name of the connector.
    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait Transaction: ReadOperations + WriteOperations + Send {
    async fn commit(&mut self) -> crate::Result<()>;

    async fn rollback(&mut self) -> crate::Result<()>;
}

#[async_trait]
pub trait ReadOperations: Send {
    /// Gets the records of `model` matching `filter`, ordered by primary key.
    ///
    /// Only the plan's columns and joins are honored; batches are fetched by
    /// the caller with follow-up calls.
    async fn get_many_records(&mut self, model: &Model, plan: &ReadPlan, filter: &Filter)
        -> crate::Result<Vec<Record>>;

    async fn count_records(&mut self, model: &Model, filter: &Filter) -> crate::Result<usize>;
}

#[async_trait]
pub trait WriteOperations: Send {
    /// Inserts a record and returns its primary key value.
    async fn create_record(&mut self, model: &Model, args: WriteArgs) -> crate::Result<Value>;

    /// Updates the record with the given primary key, returning the number of
    /// affected rows.
    async fn update_record(&mut self, model: &Model, id: &Value, args: WriteArgs) -> crate::Result<usize>;

    async fn delete_record(&mut self, model: &Model, id: &Value) -> crate::Result<usize>;
}
