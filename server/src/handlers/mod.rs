//! Request handlers for FileMaker operations.

mod names;
mod query;

pub use names::*;
pub use query::*;
