//! Source tree rewrites
//!
//! Passes that restructure an annotated or raw source tree in place before it is lowered:
//! parameter inlining, expression-list pruning, the post-annotation optimizer and the
//! all-shortest-paths predicate decomposition.

pub mod errors;
pub mod optimize;
pub mod parameters;
pub mod prune;
pub mod shortest_paths;

pub use errors::RewriteError;
pub use optimize::optimize;
pub use parameters::inline_parameters;
pub use prune::{prune, prune_children};
