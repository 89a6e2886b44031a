//! All-shortest-paths filter decomposition through the public API

use std::collections::BTreeMap;

use cypher_pgsql::cypher::{
    Comparison, Expression, Match, Operator, Parameter, PatternPart, ReadingClause, RegularQuery,
    SinglePartQuery, Where,
};
use cypher_pgsql::pgsql::Value;
use cypher_pgsql::query::criteria::*;
use cypher_pgsql::rewrite::RewriteError;
use cypher_pgsql::{translate, translate_all_shortest_paths, TranslationError, TranslatorConfig};

use super::{init_logging, test_kinds};

fn shortest_paths(expressions: Vec<Expression>) -> RegularQuery {
    RegularQuery::single_part(SinglePartQuery {
        reading_clauses: vec![ReadingClause::Match(Match {
            optional: false,
            pattern: vec![PatternPart {
                all_shortest_paths: true,
                ..Default::default()
            }],
            where_clause: Some(Where { expressions }),
        })],
        ..Default::default()
    })
}

#[test]
fn test_filters_are_split_by_binding() -> anyhow::Result<()> {
    init_logging();

    let query = shortest_paths(vec![and(vec![
        kind(start(), "NodeKindA"),
        equals(start_property("objectid"), "S-1-5-21"),
        kind_in(relationship(), ["EdgeKindA", "EdgeKindB"]),
        kind(end(), "NodeKindB"),
        equals(end_id(), 9i64),
    ])]);

    let arguments =
        translate_all_shortest_paths(&query, &test_kinds()?, &TranslatorConfig::default())?;

    assert_eq!(
        arguments.root_criteria,
        "s.kind_ids operator(pg_catalog.&&) array[1]::int2[] and s.properties->'objectid' = 'S-1-5-21'"
    );
    assert_eq!(
        arguments.traversal_criteria.as_deref(),
        Some("(r.kind_id = any(array[100]::int2[]) or r.kind_id = any(array[101]::int2[]))")
    );
    assert_eq!(
        arguments.terminal_criteria,
        "e.kind_ids operator(pg_catalog.&&) array[2]::int2[] and e.id = 9"
    );

    Ok(())
}

#[test]
fn test_configured_depth_and_stripping() -> anyhow::Result<()> {
    let query = shortest_paths(vec![and(vec![
        equals(start_id(), 1i64),
        equals(end_id(), 2i64),
    ])]);

    let mut config = TranslatorConfig::default().with_strip_literals(true);
    config.shortest_path_max_depth = 4;

    let arguments = translate_all_shortest_paths(&query, &test_kinds()?, &config)?;

    assert_eq!(arguments.root_criteria, "s.id = $STRIPPED");
    assert_eq!(arguments.terminal_criteria, "e.id = $STRIPPED");
    assert_eq!(arguments.max_depth, 4);

    Ok(())
}

#[test]
fn test_arguments_serialize_for_the_traversal_function() -> anyhow::Result<()> {
    let query = shortest_paths(vec![and(vec![
        equals(start_id(), 1i64),
        equals(end_id(), 2i64),
    ])]);

    let arguments =
        translate_all_shortest_paths(&query, &test_kinds()?, &TranslatorConfig::default())?;

    assert_eq!(
        serde_json::to_value(&arguments)?,
        serde_json::json!({
            "root_criteria": "s.id = 1",
            "traversal_criteria": null,
            "terminal_criteria": "e.id = 2",
            "max_depth": 12,
        })
    );

    Ok(())
}

#[test]
fn test_parameters_are_inlined() -> anyhow::Result<()> {
    let mut named = Parameter::new("target");
    named.value = Some(Value::from("admin"));

    let query = shortest_paths(vec![and(vec![
        equals(start_id(), 3i64),
        Comparison::new(end_property("name"), Operator::Equals, named.into()).into(),
    ])]);

    let arguments =
        translate_all_shortest_paths(&query, &test_kinds()?, &TranslatorConfig::default())?;

    assert_eq!(arguments.root_criteria, "s.id = 3");
    assert_eq!(arguments.terminal_criteria, "e.properties->'name' = 'admin'");

    Ok(())
}

#[test]
fn test_queries_without_a_root_filter_are_rejected() -> anyhow::Result<()> {
    let query = shortest_paths(vec![and(vec![
        kind(relationship(), "EdgeKindA"),
        equals(end_id(), 2i64),
    ])]);

    let result = translate_all_shortest_paths(&query, &test_kinds()?, &TranslatorConfig::default());

    assert_eq!(
        result,
        Err(TranslationError::Rewrite(RewriteError::MissingRootCriteria))
    );

    Ok(())
}

#[test]
fn test_unresolved_parameters_are_rejected() -> anyhow::Result<()> {
    let query = shortest_paths(vec![and(vec![
        equals(start_id(), 3i64),
        Comparison::new(
            end_property("name"),
            Operator::Equals,
            Parameter::new("unbound").into(),
        )
        .into(),
    ])]);

    let result = translate_all_shortest_paths(&query, &test_kinds()?, &TranslatorConfig::default());

    assert_eq!(
        result,
        Err(TranslationError::Rewrite(RewriteError::MissingParameterValue(
            "unbound".to_string()
        )))
    );

    let regular = translate(
        &query,
        &BTreeMap::new(),
        &test_kinds()?,
        &TranslatorConfig::default(),
    );
    assert!(matches!(regular, Err(TranslationError::Annotation(_))));

    Ok(())
}
