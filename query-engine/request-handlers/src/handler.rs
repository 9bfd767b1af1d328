use crate::{
    protocols::graphql::{coerce_arguments, resolve_operation, root_type_name, selection_set, shape, FieldNode, GraphqlBody},
    GQLError, GQLResponse, HandlerError,
};
use futures::FutureExt;
use query_core::{CoreError, ModelRequest, QueryExecutor};
use query_structure::{AuthenticatedUser, Value, ValueMap};
use schema::{MethodContext, QuerySchemaRef, QueryTag, Resolver, RootField};
use std::{fmt, panic::AssertUnwindSafe};
use user_facing_errors::Path;

type ResolveResult = std::result::Result<Value, HandlerError>;

pub struct RequestHandler<'a> {
    executor: &'a (dyn QueryExecutor + Send + Sync + 'a),
    query_schema: &'a QuerySchemaRef,
}

impl<'a> fmt::Debug for RequestHandler<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandler").finish()
    }
}

/// A root field that passed validation, ready to run.
struct PreparedField<'q> {
    node: FieldNode,
    root: Option<&'q RootField>,
    arguments: ValueMap,
}

impl<'a> RequestHandler<'a> {
    pub fn new(executor: &'a (dyn QueryExecutor + Send + Sync + 'a), query_schema: &'a QuerySchemaRef) -> Self {
        Self { executor, query_schema }
    }

    /// Runs a GraphQL request. Requests that fail validation are rejected as
    /// a whole with `data: null`; otherwise every root field runs on its own
    /// and failures only null out their own key.
    pub async fn execute(&self, body: GraphqlBody, user: Option<AuthenticatedUser>) -> GQLResponse {
        tracing::debug!(
            operation_name = body.operation_name.as_deref(),
            user = user.as_ref().map(tracing::field::display),
            "Incoming GraphQL query: {}",
            body.query
        );

        let (tag, fields) = match self.prepare(&body) {
            Ok(prepared) => prepared,
            Err(errors) => {
                let debug = self.debug();
                return GQLResponse::rejected(
                    errors
                        .into_iter()
                        .map(|err| GQLError::from_handler_error(err, None, debug))
                        .collect(),
                );
            }
        };

        let mut data = serde_json::Map::with_capacity(fields.len());
        let mut response_errors = Vec::new();

        for field in fields {
            let key = field.node.response_key.clone();

            let Some(root) = field.root else {
                data.insert(key, serde_json::Value::String(root_type_name(tag).to_owned()));
                continue;
            };

            let path: Path = vec![key.clone().into()];

            match AssertUnwindSafe(self.resolve(root, &field.node, field.arguments, user.clone(), path.clone()))
                .catch_unwind()
                .await
            {
                Ok(Ok(value)) => {
                    data.insert(key, shape(&value, &root.output, &field.node.selection));
                }
                Ok(Err(err)) => {
                    tracing::debug!(field = %root.name, error = %err, "root field failed");
                    data.insert(key, serde_json::Value::Null);
                    response_errors.push(GQLError::from_handler_error(err, Some(path), self.debug()));
                }
                Err(panic) => {
                    data.insert(key, serde_json::Value::Null);
                    response_errors.push(GQLError::from_panic_payload(panic, Some(path), self.debug()));
                }
            }
        }

        let mut response = GQLResponse::new(data);

        for error in response_errors {
            response.insert_error(error);
        }

        response
    }

    /// Parses and validates the document, collecting every argument error
    /// across root fields before giving up.
    fn prepare(&self, body: &GraphqlBody) -> Result<(QueryTag, Vec<PreparedField<'a>>), Vec<HandlerError>> {
        let document = graphql_parser::parse_query::<String>(&body.query).map_err(|err| vec![err.into()])?;
        let operation = resolve_operation(
            &document,
            body.operation_name.as_deref(),
            &body.variables,
            self.query_schema,
        )
        .map_err(|err| vec![err])?;

        let mut prepared = Vec::with_capacity(operation.fields.len());
        let mut errors = Vec::new();

        for node in operation.fields {
            if node.is_typename() {
                prepared.push(PreparedField {
                    node,
                    root: None,
                    arguments: ValueMap::new(),
                });
                continue;
            }

            let Some(root) = self.query_schema.find_root_field(operation.tag, &node.name) else {
                errors.push(HandlerError::malformed(format!(
                    "Cannot query field \"{}\" on type \"{}\".",
                    node.name,
                    root_type_name(operation.tag)
                )));
                continue;
            };

            match coerce_arguments(operation.tag, root, &node.arguments) {
                Ok(arguments) => prepared.push(PreparedField {
                    node,
                    root: Some(root),
                    arguments,
                }),
                Err(err) => errors.push(err),
            }
        }

        if errors.is_empty() {
            Ok((operation.tag, prepared))
        } else {
            Err(errors)
        }
    }

    async fn resolve(
        &self,
        root: &RootField,
        node: &FieldNode,
        arguments: ValueMap,
        user: Option<AuthenticatedUser>,
        path: Path,
    ) -> ResolveResult {
        match &root.resolver {
            Resolver::Model { model, action } => {
                let request = ModelRequest {
                    model: model.clone(),
                    action: *action,
                    arguments,
                    selection: selection_set(&node.selection),
                    user,
                    path,
                };

                Ok(self.executor.execute(request, self.query_schema.clone()).await?)
            }

            Resolver::Method(method) => {
                if root.force_authenticated_user && user.is_none() {
                    return Err(CoreError::Unauthenticated.into());
                }

                let context = MethodContext {
                    arguments,
                    user,
                    selection: selection_set(&node.selection),
                    path,
                };

                method(context).await.map_err(|err| CoreError::Callback(err).into())
            }
        }
    }

    fn debug(&self) -> bool {
        self.query_schema.settings().debug
    }
}
