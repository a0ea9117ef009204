//! Common types, traits, and utilities shared across the crate.

mod constants;
mod event_bus;
mod lock;
mod page;
mod sort_order;
mod util;
mod value;

pub use constants::*;
pub use event_bus::*;
pub use lock::*;
pub use page::*;
pub use sort_order::*;
pub use util::*;
pub use value::*;
