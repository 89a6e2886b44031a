//! cypher-pgsql - openCypher to PostgreSQL translation
//!
//! This crate compiles parsed openCypher queries into SQL over a relational property-graph
//! schema (a `node` table and an `edge` table with JSONB property bags and small integer kind
//! tags):
//! - Source and target syntax trees
//! - A stack-based walker shared by both trees
//! - Kind resolution, binding and type annotation
//! - Rewrite passes, including all-shortest-paths predicate decomposition
//! - SQL emission

pub mod annotation;
pub mod config;
pub mod cypher;
pub mod kinds;
pub mod pgsql;
pub mod query;
pub mod rewrite;
pub mod translate;
pub mod walk;

pub use config::{ConfigError, TranslatorConfig};
pub use kinds::{Kind, KindId, KindMapper, SchemaKindMapper};
pub use rewrite::shortest_paths::{translate_all_shortest_paths, AllShortestPathsArguments};
pub use translate::{translate, Translation, TranslationError};
