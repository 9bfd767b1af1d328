//! Executes one model operation against an open transaction.
//!
//! Nested writes recurse through boxed futures and share the transaction of
//! the root operation; the caller decides whether it is committed.

mod read;
mod serialize;
mod validation;
mod write;

use crate::{extract_filter, extract_unique_filter, planner::ReadPlanner, CoreError, CoreResult, ModelRequest};
use query_connector::Transaction;
use query_structure::{AuthenticatedUser, Model, Operation, Record, Value, ValueMap};
use schema::{HookContext, HookKind, ModelAction, ModelConfig, PermissionRequest, QuerySchemaRef, UPDATE_DATA_ARGUMENT};
use std::sync::Arc;
use user_facing_errors::{Path, PathSegment};

pub struct QueryInterpreter<'conn> {
    tx: &'conn mut dyn Transaction,
    schema: QuerySchemaRef,
    user: Option<AuthenticatedUser>,
}

impl<'conn> QueryInterpreter<'conn> {
    pub fn new(tx: &'conn mut dyn Transaction, schema: QuerySchemaRef, user: Option<AuthenticatedUser>) -> Self {
        QueryInterpreter { tx, schema, user }
    }

    pub async fn interpret(&mut self, config: &ModelConfig, request: ModelRequest) -> CoreResult<Value> {
        let model = config.model.clone();
        let ModelRequest {
            action,
            mut arguments,
            selection,
            path,
            ..
        } = request;

        match action {
            ModelAction::ReadOne => {
                let filter = extract_unique_filter(&model, &arguments)?;
                self.read_one(&model, &selection, filter, &arguments, &path).await
            }

            ModelAction::ReadMany => {
                let filter = extract_filter(&model, &arguments)?;
                self.read_many(&model, &selection, filter, &path).await
            }

            ModelAction::Create => {
                // Creating a record implies being allowed to see it.
                let id = self.create_record(&model, arguments, path.clone()).await?;
                self.read_back(&model, id, &selection, &path, false).await
            }

            ModelAction::Update => {
                let data = match arguments.shift_remove(UPDATE_DATA_ARGUMENT) {
                    Some(Value::Object(data)) => data,
                    Some(Value::Null) | None => ValueMap::new(),
                    Some(other) => {
                        return Err(CoreError::InvalidArgument {
                            argument: UPDATE_DATA_ARGUMENT.to_owned(),
                            reason: format!("expected an object, found {other}"),
                        })
                    }
                };

                let filter = extract_unique_filter(&model, &arguments)?;
                let id = self.update_record(&model, filter, arguments, data, path.clone()).await?;

                self.read_back(&model, id, &selection, &path, true).await
            }

            ModelAction::Delete => {
                let filter = extract_unique_filter(&model, &arguments)?;
                self.delete_one(&model, &selection, filter, &arguments, &path).await
            }
        }
    }

    fn config(&self, model: &Model) -> Option<Arc<ModelConfig>> {
        self.schema.configs().for_model(model).cloned()
    }

    fn planner(&self) -> ReadPlanner<'_> {
        ReadPlanner::new(self.schema.configs(), self.schema.settings())
    }

    fn user(&self) -> Option<&AuthenticatedUser> {
        self.user.as_ref()
    }

    fn row_filter(&self, model: &Model) -> query_structure::Filter {
        match self.config(model) {
            Some(config) => config.row_filter(self.user()),
            None => query_structure::Filter::empty(),
        }
    }

    fn is_allowed(&self, model: &Model, operation: Operation, instance: &Record, data: Option<&ValueMap>) -> bool {
        let Some(config) = self.config(model) else {
            return true;
        };

        config.check_permissions(&PermissionRequest {
            operation,
            instance,
            user: self.user(),
            data,
        })
    }

    fn ensure_permission(
        &self,
        model: &Model,
        operation: Operation,
        instance: &Record,
        data: Option<&ValueMap>,
        path: &Path,
    ) -> CoreResult<()> {
        if self.is_allowed(model, operation, instance, data) {
            Ok(())
        } else {
            Err(CoreError::forbidden(operation, self.user(), path))
        }
    }

    fn run_hooks(
        &self,
        model: &Model,
        kind: HookKind,
        operation: Operation,
        instance: &mut Record,
        data: &ValueMap,
    ) -> CoreResult<()> {
        let Some(config) = self.config(model) else {
            return Ok(());
        };

        let mut context = HookContext {
            operation,
            instance,
            user: self.user(),
            data,
        };

        config.run_hooks(kind, &mut context)?;

        Ok(())
    }
}

fn child_path<I, S>(path: &Path, segments: I) -> Path
where
    I: IntoIterator<Item = S>,
    S: Into<PathSegment>,
{
    let mut path = path.clone();
    path.extend(segments.into_iter().map(Into::into));
    path
}
