#![deny(rust_2018_idioms, unsafe_code)]

//! Derives the query schema from the data model and the exposition policy of
//! every exposed model.

mod builder;
mod cache;
mod error;
mod exposition;
mod fields_info;
mod filters;
mod lookups;
mod query_schema;
mod settings;
mod type_decl;
mod type_graph;
mod types;

pub use builder::*;
pub use error::*;
pub use exposition::*;
pub use fields_info::*;
pub use filters::build_filters;
pub use lookups::*;
pub use query_schema::*;
pub use settings::*;
pub use type_decl::*;
pub use type_graph::*;
pub use types::*;

use std::sync::Arc;

pub type QuerySchemaRef = Arc<QuerySchema>;
