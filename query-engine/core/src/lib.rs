#![deny(rust_2018_idioms, unsafe_code)]

pub mod error;
pub mod executor;
pub mod extractors;
pub mod interpreter;
pub mod planner;

pub use error::CoreError;
pub use executor::*;
pub use extractors::*;
pub use interpreter::QueryInterpreter;
pub use planner::ReadPlanner;

pub type CoreResult<T> = Result<T, CoreError>;
