//! Compilation of filters, options, and update specifications into
//! parameterized SQL statements.
//!
//! Every caller-supplied value travels as a bound positional parameter,
//! never as literal text inside the statement. Parameter indices are
//! 1-based and assigned in arrival order, which for filters is the
//! filter's own field order.

mod mutate;
mod select;
mod statement;

pub use mutate::*;
pub use select::*;
pub use statement::*;
