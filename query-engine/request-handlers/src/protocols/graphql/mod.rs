mod arguments;
mod body;
mod classifier;
mod document;
mod output;
mod schema_renderer;

pub use body::GraphqlBody;
pub use classifier::classify;
pub use schema_renderer::render_graphql_schema;

pub(crate) use arguments::coerce_arguments;
pub(crate) use document::{resolve_operation, root_type_name, selection_set, FieldNode};
pub(crate) use output::shape;
