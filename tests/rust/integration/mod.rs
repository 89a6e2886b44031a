//! Integration tests - criteria built through the query builder, carried through the whole
//! translation pipeline
//!
//! These tests verify that the builder, annotation, optimizer and SQL emitter work together.

mod builder_golden_tests;
mod kind_mapper_tests;
mod shortest_path_tests;

use cypher_pgsql::SchemaKindMapper;

/// Route `log` output through the test harness. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The kind table every golden case is written against.
pub fn test_kinds() -> anyhow::Result<SchemaKindMapper> {
    Ok(SchemaKindMapper::with_kinds([
        ("NodeKindA", 1),
        ("NodeKindB", 2),
        ("NodeKindC", 3),
        ("EdgeKindA", 100),
        ("EdgeKindB", 101),
        ("EdgeKindC", 102),
        ("EdgeKindD", 103),
    ])?)
}
