pub mod error;

mod interface;
mod read_plan;
mod write_args;

pub use interface::*;
pub use read_plan::*;
pub use query_structure::PATH_SEPARATOR;
pub use write_args::*;

pub type Result<T> = std::result::Result<T, error::ConnectorError>;
