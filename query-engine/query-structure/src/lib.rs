mod auth;
mod builders;
mod error;
mod field;
mod internal_data_model;
mod model;
mod operation;
mod record;
mod selection;
mod value;
mod zipper;

pub mod filter;

pub use auth::*;
pub use builders::*;
pub use error::*;
pub use field::*;
pub use filter::*;
pub use internal_data_model::*;
pub use model::*;
pub use operation::*;
pub use record::*;
pub use selection::*;
pub use value::*;
pub use zipper::*;

pub type Result<T> = std::result::Result<T, DomainError>;
