//! Programmatic query construction
//!
//! Callers that hold criteria rather than query text assemble source queries here. Node criteria
//! are written against the `n` binding and relationship criteria against `s`, `r` and `e` (start
//! node, edge, end node). [`QueryBuilder`] derives the match pattern from whichever of those
//! bindings the criteria reference.

pub mod builder;
pub mod criteria;
pub mod errors;

pub use builder::{Criteria, QueryBuilder};
pub use criteria::*;
pub use errors::QueryBuilderError;

pub const NODE_SYMBOL: &str = "n";
pub const EDGE_SYMBOL: &str = "r";
pub const EDGE_START_SYMBOL: &str = "s";
pub const EDGE_END_SYMBOL: &str = "e";

pub const IDENTITY_FUNCTION: &str = "id";
