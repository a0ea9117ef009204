//! Query filters for selecting documents from collections.
//!
//! A [Filter] is an ordered mapping from field name to [Condition].
//! The order is semantic: positional parameters are assigned in arrival
//! order, and the default sort of a find without explicit sort follows
//! the filter's field order.
//!
//! # Creating Filters
//!
//! Filters are created using the fluent API or parsed from Mongo-style
//! condition documents:
//! - `field("age").gt(30)` - comparison operators
//! - `field("name").eq("Alice")` - equality checks
//! - `field("edition").in_array(vec![2, 3])` - containment
//! - `field("title").matches("adventure")` - pattern condition
//! - `all()` - match all documents
//! - `field("a").eq(1).and(field("b").gt(2))` - conjunction
//!
//! # Supported Operators
//!
//! The operator set is fixed: `eq`, `ne`, `in`, `containsAny`, `lt`,
//! `lte`, `gt`, `gte`, `regex`. Anything else rejects the whole call
//! with an `UnsupportedOperator` error; conditions are never silently
//! dropped.

mod condition;
mod fluent;

pub use condition::*;
pub use fluent::*;
