//! PostgreSQL target model: syntax tree, storage types, expression builder and SQL emission.

pub mod ast;
pub mod builder;
pub mod errors;
pub mod format;
pub mod identifier_set;
pub mod types;

pub use ast::{Expression, Identifier, Operator, Statement};
pub use builder::Tree;
pub use errors::{BuildError, FormatError, TypeError};
pub use format::{format_statement, SqlWriter, ToSql};
pub use identifier_set::IdentifierSet;
pub use types::{DataType, Value};
