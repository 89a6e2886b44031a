//! Golden SQL for queries assembled from builder criteria

use std::collections::BTreeMap;

use chrono::DateTime;
use cypher_pgsql::cypher::Expression;
use cypher_pgsql::pgsql::Value;
use cypher_pgsql::query::criteria::*;
use cypher_pgsql::query::{Criteria, QueryBuilder};
use cypher_pgsql::{translate, Translation, TranslatorConfig};
use test_case::test_case;

use super::{init_logging, test_kinds};

fn translate_criteria(criteria: Vec<Criteria>) -> anyhow::Result<Translation> {
    init_logging();

    let query = QueryBuilder::with_criteria(criteria).build()?;
    let translation = translate(
        &query,
        &BTreeMap::new(),
        &test_kinds()?,
        &TranslatorConfig::default(),
    )?;

    Ok(translation)
}

fn normalize_whitespace(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parameters<const N: usize>(entries: [(&str, Value); N]) -> BTreeMap<String, Value> {
    entries
        .into_iter()
        .map(|(symbol, value)| (symbol.to_string(), value))
        .collect()
}

fn ids_in() -> Vec<Criteria> {
    vec![
        where_clause(and(vec![in_ids(node(), vec![1, 2, 3])])),
        returning(vec![node()]),
    ]
}

fn property_in(values: Value) -> Vec<Criteria> {
    vec![
        where_clause(and(vec![in_values(node_property("prop"), values)])),
        returning(vec![node_id()]),
    ]
}

fn delete_matched_edges() -> Vec<Criteria> {
    vec![
        where_clause(and(vec![
            kind(relationship(), "EdgeKindA"),
            kind(end(), "NodeKindA"),
            in_values(end_property("objectid"), vec!["12345", "23456"]),
        ])),
        delete(vec![relationship()]),
    ]
}

fn contains_and_exists() -> Vec<Criteria> {
    vec![
        where_clause(and(vec![
            kind(node(), "NodeKindA"),
            string_contains(node_property("operatingsystem"), "WINDOWS"),
            exists(node_property("pwdlastset")),
        ])),
        returning(vec![node_id()]),
    ]
}

fn kinds_and_suffix() -> Vec<Criteria> {
    vec![
        where_clause(and(vec![
            kind_in(node(), ["NodeKindA", "NodeKindB"]),
            string_ends_with(node_property("objectid"), "-5-1-9"),
            equals(node_property("domainsid"), "DOMAINSID"),
        ])),
        returning(vec![node_id()]),
    ]
}

fn start_of_kinds() -> Vec<Criteria> {
    vec![
        where_clause(kind_in(relationship(), ["EdgeKindA", "EdgeKindB"])),
        returning(vec![start()]),
    ]
}

fn without_relationships() -> Vec<Criteria> {
    vec![
        where_clause(not(has_relationships("n"))),
        returning(vec![node_id()]),
    ]
}

fn stale_edges() -> anyhow::Result<Vec<Criteria>> {
    let cutoff = DateTime::parse_from_rfc3339("2023-08-01T00:00:00+00:00")?;

    Ok(vec![
        where_clause(and(vec![
            kind_in(relationship(), ["EdgeKindA", "EdgeKindB"]),
            or(vec![
                not(exists(relationship_property("lastseen"))),
                before(relationship_property("lastseen"), cutoff),
            ]),
        ])),
        returning(vec![relationship()]),
    ])
}

fn excluded_kinds() -> Expression {
    not(and(vec![
        kind(node(), "NodeKindB"),
        not(kind(node(), "NodeKindC")),
    ]))
}

fn delete_by_name() -> Vec<Criteria> {
    vec![
        where_clause(and(vec![
            kind(node(), "NodeKindA"),
            or(vec![
                equals(node_property("name"), "12345"),
                equals(node_property("objectid"), "12345"),
            ]),
            excluded_kinds(),
        ])),
        delete(vec![node()]),
    ]
}

fn search_by_name() -> Vec<Criteria> {
    vec![
        where_clause(and(vec![
            kind(node(), "NodeKindA"),
            or(vec![
                string_contains(node_property("name"), "name"),
                string_contains(node_property("objectid"), "name"),
            ]),
            not(equals(node_property("name"), "name")),
            not(equals(node_property("objectid"), "name")),
            excluded_kinds(),
        ])),
        returning(vec![node_id()]),
    ]
}

const N_ID: &str = "select n.id as \"n.id\" from node as n where";

#[test_case(ids_in(), "select (n.id, n.kind_ids, n.properties)::nodeComposite as n from node as n where n.id = any(@p0)" ; "in ids")]
#[test_case(property_in(vec!["1", "2", "3"].into()), &format!("{N_ID} (n.properties->>'prop')::text = any(@p0)") ; "in strings")]
#[test_case(property_in(vec![1i16, 2, 3].into()), &format!("{N_ID} (n.properties->'prop')::int2 = any(@p0)") ; "in int2")]
#[test_case(property_in(vec![1i32, 2, 3].into()), &format!("{N_ID} (n.properties->'prop')::int4 = any(@p0)") ; "in int4")]
#[test_case(property_in(vec![1i64, 2, 3].into()), &format!("{N_ID} (n.properties->'prop')::int8 = any(@p0)") ; "in int8")]
#[test_case(property_in(vec![1f32, 2.0, 3.0].into()), &format!("{N_ID} (n.properties->'prop')::float4 = any(@p0)") ; "in float4")]
#[test_case(property_in(vec![1f64, 2.0, 3.0].into()), &format!("{N_ID} (n.properties->'prop')::float8 = any(@p0)") ; "in float8")]
#[test_case(delete_matched_edges(), "delete from edge as r using node as n0, node as e where r.kind_id = any(array[100]::int2[]) and e.kind_ids operator(pg_catalog.&&) array[1]::int2[] and (e.properties->>'objectid')::text = any(@p0) and n0.id = r.start_id and e.id = r.end_id" ; "delete matched edges")]
#[test_case(contains_and_exists(), &format!("{N_ID} n.kind_ids operator(pg_catalog.&&) array[1]::int2[] and (n.properties->>'operatingsystem')::text like @p0 and n.properties ? 'pwdlastset'") ; "contains and exists")]
#[test_case(kinds_and_suffix(), &format!("{N_ID} (n.kind_ids operator(pg_catalog.&&) array[1, 2]::int2[]) and (n.properties->>'objectid')::text like @p0 and (n.properties->>'domainsid')::text = @p1") ; "merged kinds and suffix")]
#[test_case(start_of_kinds(), "select (s.id, s.kind_ids, s.properties)::nodeComposite as s from node as s join edge r on r.start_id = s.id join node n0 on n0.id = r.end_id where (r.kind_id = any(array[100, 101]::int2[]))" ; "start node of merged edge kinds")]
#[test_case(without_relationships(), &format!("{N_ID} not exists(select * from node as n2 join edge e0 on e0.start_id = n2.id or e0.end_id = n2.id join node n1 on n1.id = e0.start_id or n1.id = e0.end_id  where n.id = n2.id limit 1)") ; "without relationships")]
#[test_case(delete_by_name(), "delete from node as n where n.kind_ids operator(pg_catalog.&&) array[1]::int2[] and ((n.properties->>'name')::text = @p0 or (n.properties->>'objectid')::text = @p1) and not (n.kind_ids operator(pg_catalog.&&) array[2]::int2[] and not n.kind_ids operator(pg_catalog.&&) array[3]::int2[])" ; "delete by name")]
#[test_case(search_by_name(), &format!("{N_ID} n.kind_ids operator(pg_catalog.&&) array[1]::int2[] and ((n.properties->>'name')::text like @p0 or (n.properties->>'objectid')::text like @p1) and not (n.properties->>'name')::text = @p2 and not (n.properties->>'objectid')::text = @p3 and not (n.kind_ids operator(pg_catalog.&&) array[2]::int2[] and not n.kind_ids operator(pg_catalog.&&) array[3]::int2[])") ; "search by name")]
fn test_builder_golden(criteria: Vec<Criteria>, expected: &str) -> anyhow::Result<()> {
    let translation = translate_criteria(criteria)?;

    assert_eq!(
        normalize_whitespace(&translation.sql),
        normalize_whitespace(expected)
    );

    Ok(())
}

#[test]
fn test_stale_edges() -> anyhow::Result<()> {
    let translation = translate_criteria(stale_edges()?)?;

    assert_eq!(
        translation.sql,
        "select (r.id, r.start_id, r.end_id, r.kind_id, r.properties)::edgeComposite as r from node as n0 join edge r on r.start_id = n0.id join node n1 on n1.id = r.end_id where (r.kind_id = any(array[100, 101]::int2[])) and (not r.properties ? 'lastseen' or (r.properties->>'lastseen')::timestamp with time zone < @p0)"
    );
    assert_eq!(translation.parameters.len(), 1);

    Ok(())
}

#[test]
fn test_string_match_parameters_carry_wildcards() -> anyhow::Result<()> {
    let translation = translate_criteria(kinds_and_suffix())?;

    assert_eq!(
        translation.parameters,
        parameters([
            ("p0", Value::from("%-5-1-9")),
            ("p1", Value::from("DOMAINSID")),
        ])
    );

    Ok(())
}

#[test]
fn test_parameters_follow_visit_order() -> anyhow::Result<()> {
    let translation = translate_criteria(search_by_name())?;

    assert_eq!(
        translation.parameters,
        parameters([
            ("p0", Value::from("%name%")),
            ("p1", Value::from("%name%")),
            ("p2", Value::from("name")),
            ("p3", Value::from("name")),
        ])
    );

    Ok(())
}

#[test]
fn test_update_parameters_replace_folded_values() -> anyhow::Result<()> {
    let translation = translate_criteria(vec![
        where_clause(kind(node(), "NodeKindA")),
        set_property(node_property("name"), "renamed"),
        returning(vec![node()]),
    ])?;

    assert_eq!(
        translation.sql,
        "update node as n set properties = properties || @p1 where n.kind_ids operator(pg_catalog.&&) array[1]::int2[] returning (n.id, n.kind_ids, n.properties)::nodeComposite as n"
    );
    assert_eq!(
        translation.parameters,
        parameters([(
            "p1",
            Value::Jsonb(serde_json::json!({ "name": "renamed" }))
        )])
    );

    Ok(())
}

#[test]
fn test_kind_and_property_removal() -> anyhow::Result<()> {
    let translation = translate_criteria(vec![
        where_clause(equals(node_id(), 7i64)),
        delete_kind(node(), "NodeKindB"),
        delete_properties("n", &["stale", "legacy"]),
    ])?;

    assert_eq!(
        translation.sql,
        "update node as n set properties = properties - @p1::text[], kind_ids = kind_ids - @p2 where n.id = @p0"
    );
    assert_eq!(
        translation.parameters,
        parameters([
            ("p0", Value::from(7i64)),
            (
                "p1",
                Value::StringArray(vec!["stale".to_string(), "legacy".to_string()])
            ),
            ("p2", Value::Int16Array(vec![2])),
        ])
    );

    Ok(())
}

#[test]
fn test_builder_rejects_mixed_bindings() -> anyhow::Result<()> {
    let result = QueryBuilder::with_criteria(vec![
        where_clause(and(vec![
            equals(node_property("name"), "a"),
            equals(start_property("name"), "b"),
        ])),
        returning(vec![node()]),
    ])
    .build();

    assert_eq!(
        result.err(),
        Some(cypher_pgsql::query::QueryBuilderError::MixedBindings)
    );

    Ok(())
}
