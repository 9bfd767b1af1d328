use super::{ModelRequest, QueryExecutor};
use crate::{interpreter::QueryInterpreter, CoreError, CoreResult};
use async_trait::async_trait;
use query_connector::Connector;
use query_structure::Value;
use schema::QuerySchemaRef;
use tracing::Instrument;

/// Central query executor and main entry point into the query core.
pub struct InterpretingExecutor<C> {
    connector: C,
}

impl<C> InterpretingExecutor<C>
where
    C: Connector + Send + Sync,
{
    pub fn new(connector: C) -> Self {
        InterpretingExecutor { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }
}

#[async_trait]
impl<C> QueryExecutor for InterpretingExecutor<C>
where
    C: Connector + Send + Sync,
{
    async fn execute(&self, request: ModelRequest, query_schema: QuerySchemaRef) -> CoreResult<Value> {
        let span = tracing::info_span!("execute", model = %request.model, operation = ?request.action);

        async move {
            let config = query_schema
                .config(&request.model)
                .cloned()
                .ok_or_else(|| CoreError::ConfigurationError(format!("Model `{}` is not exposed", request.model)))?;

            if config.force_authenticated_user && request.user.is_none() {
                return Err(CoreError::Unauthenticated);
            }

            let mut tx = self.connector.start_transaction().await?;

            let result = QueryInterpreter::new(tx.as_mut(), query_schema.clone(), request.user.clone())
                .interpret(&config, request)
                .await;

            match result {
                Ok(value) => {
                    tx.commit().await?;
                    Ok(value)
                }
                Err(err) => {
                    if let Err(rollback_err) = tx.rollback().await {
                        tracing::error!(error = %rollback_err, "rollback failed");
                    }

                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    fn primary_connector(&self) -> &'static str {
        self.connector.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelRequest;
    use query_connector::{
        error::{ConnectorError, ErrorKind},
        ReadOperations, ReadPlan, Transaction, WriteArgs, WriteOperations,
    };
    use query_structure::{DataModelBuilder, Filter, Model, ModelBuilder, Record, ScalarFieldBuilder, SelectionSet};
    use schema::{ModelAction, ModelExposition, SchemaBuilder, Settings};
    use tracing_test::traced_test;

    struct Broken;

    fn missing_table() -> ConnectorError {
        ConnectorError::from_kind(ErrorKind::TableDoesNotExist { table: "house".into() })
    }

    #[async_trait]
    impl Connector for Broken {
        async fn start_transaction(&self) -> query_connector::Result<Box<dyn Transaction>> {
            Ok(Box::new(Broken))
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    #[async_trait]
    impl Transaction for Broken {
        async fn commit(&mut self) -> query_connector::Result<()> {
            Ok(())
        }

        async fn rollback(&mut self) -> query_connector::Result<()> {
            Err(ConnectorError::from_kind(ErrorKind::TransactionError("connection lost".into())))
        }
    }

    #[async_trait]
    impl ReadOperations for Broken {
        async fn get_many_records(
            &mut self,
            _: &Model,
            _: &ReadPlan,
            _: &Filter,
        ) -> query_connector::Result<Vec<Record>> {
            Err(missing_table())
        }

        async fn count_records(&mut self, _: &Model, _: &Filter) -> query_connector::Result<usize> {
            Err(missing_table())
        }
    }

    #[async_trait]
    impl WriteOperations for Broken {
        async fn create_record(&mut self, _: &Model, _: WriteArgs) -> query_connector::Result<Value> {
            Err(missing_table())
        }

        async fn update_record(&mut self, _: &Model, _: &Value, _: WriteArgs) -> query_connector::Result<usize> {
            Err(missing_table())
        }

        async fn delete_record(&mut self, _: &Model, _: &Value) -> query_connector::Result<usize> {
            Err(missing_table())
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn failed_rollbacks_do_not_hide_the_original_error() {
        let data_model = DataModelBuilder::new()
            .model(
                ModelBuilder::new("House")
                    .table("house")
                    .field(ScalarFieldBuilder::auto_id("id")),
            )
            .build()
            .unwrap();

        let builder = SchemaBuilder::new(data_model, Settings::default());
        builder.expose_model(ModelExposition::new("House")).unwrap();
        let schema = builder.build().unwrap();

        let request = ModelRequest {
            model: "house".into(),
            action: ModelAction::ReadMany,
            arguments: Default::default(),
            selection: SelectionSet::new().leaf("id"),
            user: None,
            path: vec!["houses".into()],
        };

        let err = InterpretingExecutor::new(Broken)
            .execute(request, schema)
            .await
            .unwrap_err();

        let CoreError::ConnectorError(inner) = &err else {
            panic!("expected a connector error, got {err}");
        };
        assert!(matches!(inner.kind, ErrorKind::TableDoesNotExist { .. }), "{err}");
        assert!(logs_contain("rollback failed"));
    }
}
