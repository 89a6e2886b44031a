//! Kind resolution through a mocked kind mapper

use std::collections::BTreeMap;

use cypher_pgsql::kinds::KindError;
use cypher_pgsql::query::criteria::*;
use cypher_pgsql::query::QueryBuilder;
use cypher_pgsql::{translate, Kind, KindId, KindMapper, TranslationError, TranslatorConfig};
use mockall::mock;
use mockall::predicate::eq;

use super::init_logging;

mock! {
    pub Mapper {}

    impl KindMapper for Mapper {
        fn map_kinds(&self, kinds: &[Kind]) -> (Vec<KindId>, Vec<Kind>);
        fn assert_kinds(&self, kinds: &[Kind]) -> Result<Vec<KindId>, KindError>;
    }
}

fn kind_filter_query(kind_name: &str) -> anyhow::Result<cypher_pgsql::cypher::RegularQuery> {
    Ok(QueryBuilder::with_criteria(vec![
        where_clause(kind(node(), kind_name)),
        returning(vec![node_id()]),
    ])
    .build()?)
}

#[test]
fn test_undefined_kinds_are_rejected() -> anyhow::Result<()> {
    init_logging();

    let mut mapper = MockMapper::new();
    mapper
        .expect_map_kinds()
        .with(eq(vec![Kind::from("Missing")]))
        .times(1)
        .returning(|kinds| (Vec::new(), kinds.to_vec()));
    mapper.expect_assert_kinds().never();

    let result = translate(
        &kind_filter_query("Missing")?,
        &BTreeMap::new(),
        &mapper,
        &TranslatorConfig::default(),
    );

    assert_eq!(
        result.err(),
        Some(TranslationError::UndefinedKinds(vec!["Missing".to_string()]))
    );

    Ok(())
}

#[test]
fn test_asserting_kinds_allocates_ids() -> anyhow::Result<()> {
    init_logging();

    let mut mapper = MockMapper::new();
    mapper.expect_map_kinds().never();
    mapper
        .expect_assert_kinds()
        .times(1)
        .returning(|_| Ok(vec![42]));

    let config = TranslatorConfig::default().with_assert_kinds(true);
    let translation = translate(&kind_filter_query("Fresh")?, &BTreeMap::new(), &mapper, &config)?;

    assert_eq!(
        translation.sql,
        "select n.id as \"n.id\" from node as n where n.kind_ids operator(pg_catalog.&&) array[42]::int2[]"
    );

    Ok(())
}

#[test]
fn test_kind_mapper_failures_propagate() -> anyhow::Result<()> {
    init_logging();

    let mut mapper = MockMapper::new();
    mapper
        .expect_assert_kinds()
        .returning(|kinds| Err(KindError::Exhausted(kinds[0].clone())));

    let config = TranslatorConfig::default().with_assert_kinds(true);
    let result = translate(&kind_filter_query("Overflow")?, &BTreeMap::new(), &mapper, &config);

    assert_eq!(
        result.err(),
        Some(TranslationError::Kind(KindError::Exhausted(Kind::from("Overflow"))))
    );

    Ok(())
}

#[test]
fn test_unknown_update_kinds() -> anyhow::Result<()> {
    init_logging();

    let mut mapper = MockMapper::new();
    mapper.expect_map_kinds().returning(|kinds| {
        let known: Vec<KindId> = kinds
            .iter()
            .filter(|kind| kind.as_str() == "Known")
            .map(|_| 1)
            .collect();
        let missing = kinds
            .iter()
            .filter(|kind| kind.as_str() != "Known")
            .cloned()
            .collect();

        (known, missing)
    });

    let query = QueryBuilder::with_criteria(vec![
        where_clause(kind(node(), "Known")),
        add_kind(node(), "Unheard"),
    ])
    .build()?;

    let result = translate(&query, &BTreeMap::new(), &mapper, &TranslatorConfig::default());

    assert_eq!(
        result.err(),
        Some(TranslationError::UnknownUpdateKinds(vec!["Unheard".to_string()]))
    );

    Ok(())
}
