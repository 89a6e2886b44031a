//! Unit tests for binding and type annotation of Cypher queries

use std::collections::BTreeMap;

use cypher_pgsql::annotation::{annotate, collect_parameters, AnnotationError};
use cypher_pgsql::cypher::{
    Comparison, CypherNode, Direction, Expression, Match, NodePattern, Operator, Parameter,
    PatternElement, PatternPart, PropertyLookup, ReadingClause, RegularQuery,
    RelationshipPattern, Return, SinglePartQuery, Variable, Where,
};
use cypher_pgsql::pgsql::types::DataType;
use cypher_pgsql::pgsql::Value;

fn query(elements: Vec<PatternElement>, where_clause: Option<Expression>) -> RegularQuery {
    RegularQuery::single_part(SinglePartQuery {
        reading_clauses: vec![ReadingClause::Match(Match {
            optional: false,
            pattern: vec![PatternPart {
                elements,
                ..Default::default()
            }],
            where_clause: where_clause.map(Where::new),
        })],
        updating_clauses: Vec::new(),
        return_clause: Some(Return::default()),
    })
}

fn node(symbol: Option<&str>) -> PatternElement {
    PatternElement::Node(NodePattern {
        binding: symbol.map(Variable::new),
        ..Default::default()
    })
}

fn relationship(symbol: Option<&str>) -> PatternElement {
    PatternElement::Relationship(RelationshipPattern {
        binding: symbol.map(Variable::new),
        direction: Direction::Outbound,
        ..Default::default()
    })
}

fn name_compared_to(operator: Operator, parameter: &str) -> Expression {
    Comparison::new(
        PropertyLookup::new("s", "name").into(),
        operator,
        Parameter::new(parameter).into(),
    )
    .into()
}

fn where_expression(query: &RegularQuery) -> &Expression {
    let single = query.as_single_part().expect("single part query");

    match single.reading_clauses.first() {
        Some(ReadingClause::Match(Match {
            where_clause: Some(where_clause),
            ..
        })) => where_clause.expressions.first().expect("where expression"),
        _ => panic!("expected a match with a where clause"),
    }
}

#[test]
fn test_anonymous_elements_receive_synthetic_bindings() {
    let mut query = query(vec![node(None), relationship(Some("r")), node(None)], None);

    let binder = annotate(&mut query, BTreeMap::new()).expect("annotates");

    assert_eq!(binder.binding_type("r"), Some(DataType::Edge));
    assert_eq!(binder.binding_type("n0"), Some(DataType::Node));
    assert_eq!(binder.binding_type("n1"), Some(DataType::Node));
    assert!(binder.is_synthetic("n0"));
    assert!(!binder.is_synthetic("r"));
    assert!(binder.is_pattern_binding("r"));
}

#[test]
fn test_parameters_are_renamed_in_visit_order() {
    let criteria = Expression::conjunction(vec![
        name_compared_to(Operator::Equals, "first"),
        name_compared_to(Operator::NotEquals, "second"),
    ]);

    let mut query = query(vec![node(Some("s"))], Some(criteria));
    let parameters = BTreeMap::from([
        ("first".to_string(), Value::from("a")),
        ("second".to_string(), Value::from("b")),
    ]);

    annotate(&mut query, parameters).expect("annotates");

    let collected = collect_parameters(CypherNode::RegularQuery(&query)).expect("collects");
    assert_eq!(
        collected,
        BTreeMap::from([
            ("p0".to_string(), Value::from("a")),
            ("p1".to_string(), Value::from("b")),
        ])
    );
}

#[test]
fn test_missing_parameter_value() {
    let mut query = query(
        vec![node(Some("s"))],
        Some(name_compared_to(Operator::Equals, "absent")),
    );

    assert_eq!(
        annotate(&mut query, BTreeMap::new()).err(),
        Some(AnnotationError::MissingParameterValue("absent".to_string()))
    );
}

#[test]
fn test_string_operator_parameters_gain_wildcards() {
    let mut query = query(
        vec![node(Some("s"))],
        Some(name_compared_to(Operator::StartsWith, "prefix")),
    );
    let parameters = BTreeMap::from([("prefix".to_string(), Value::from("adm"))]);

    annotate(&mut query, parameters).expect("annotates");

    let Expression::Comparison(comparison) = where_expression(&query) else {
        panic!("expected a comparison");
    };

    let Expression::Parameter(parameter) = &comparison.partials[0].right else {
        panic!("expected a parameter operand");
    };

    assert_eq!(parameter.value, Some(Value::from("adm%")));
    assert_eq!(parameter.data_type, Some(DataType::Text));
}

#[test]
fn test_string_operator_rejects_non_string_values() {
    let mut query = query(
        vec![node(Some("s"))],
        Some(name_compared_to(Operator::Contains, "needle")),
    );
    let parameters = BTreeMap::from([("needle".to_string(), Value::from(42i64))]);

    assert_eq!(
        annotate(&mut query, parameters).err(),
        Some(AnnotationError::StringOperand("contains"))
    );
}
