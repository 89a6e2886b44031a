//! openCypher source model
//!
//! Parsing query text is left to an external front end; everything downstream consumes the
//! [`ast::RegularQuery`] it produces.

pub mod ast;
pub mod node;

pub use ast::*;
pub use node::{CypherNode, CypherNodeMut};
