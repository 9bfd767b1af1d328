mod interpreting_executor;

pub use interpreting_executor::InterpretingExecutor;

use crate::CoreResult;
use async_trait::async_trait;
use query_structure::{AuthenticatedUser, SelectionSet, Value, ValueMap};
use schema::{ModelAction, QuerySchemaRef};
use user_facing_errors::Path;

/// One generated operation on an exposed model, with its arguments already
/// coerced to storage values.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Exposed name of the model.
    pub model: String,
    pub action: ModelAction,
    pub arguments: ValueMap,
    pub selection: SelectionSet,
    pub user: Option<AuthenticatedUser>,
    /// Location of the operation in the response, prefixed to error paths.
    pub path: Path,
}

#[async_trait]
pub trait QueryExecutor {
    /// Executes a single model operation in its own transaction and returns
    /// the shaped result tree.
    async fn execute(&self, request: ModelRequest, query_schema: QuerySchemaRef) -> CoreResult<Value>;

    /// Name of the connector all operations run against.
    fn primary_connector(&self) -> &'static str;
}
