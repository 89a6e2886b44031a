//! Criteria constructors.
//!
//! Every value handed to a comparison helper becomes a bound parameter so the translated query
//! carries it out of band.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

use crate::cypher::{
    AssignmentOperator, Comparison, Create, Delete, Direction, Expression, FunctionInvocation,
    KindMatcher, Limit, Literal, Negation, NodePattern, Operator, Order, Parameter,
    PatternElement, PatternPart, PatternPredicate, Projection, ProjectionItem, PropertyLookup,
    RelationshipPattern, Remove, RemoveItem, Return, Set, SetItem, Skip, SortItem,
    UpdatingClause, Variable, Where,
};
use crate::kinds::Kind;
use crate::pgsql::types::Value;

use super::builder::Criteria;
use super::{EDGE_END_SYMBOL, EDGE_START_SYMBOL, EDGE_SYMBOL, IDENTITY_FUNCTION, NODE_SYMBOL};

pub fn node() -> Expression {
    Expression::variable(NODE_SYMBOL)
}

pub fn relationship() -> Expression {
    Expression::variable(EDGE_SYMBOL)
}

pub fn start() -> Expression {
    Expression::variable(EDGE_START_SYMBOL)
}

pub fn end() -> Expression {
    Expression::variable(EDGE_END_SYMBOL)
}

/// `id(reference)`
pub fn identity(reference: Expression) -> Expression {
    FunctionInvocation::new(IDENTITY_FUNCTION, vec![reference]).into()
}

pub fn node_id() -> Expression {
    identity(node())
}

pub fn relationship_id() -> Expression {
    identity(relationship())
}

pub fn start_id() -> Expression {
    identity(start())
}

pub fn end_id() -> Expression {
    identity(end())
}

pub fn kind(reference: Expression, kind: impl Into<Kind>) -> Expression {
    KindMatcher::new(reference, vec![kind.into()]).into()
}

/// A parenthesized disjunction with one kind matcher per kind.
pub fn kind_in<I, K>(reference: Expression, kinds: I) -> Expression
where
    I: IntoIterator<Item = K>,
    K: Into<Kind>,
{
    or(kinds
        .into_iter()
        .map(|next| kind(reference.clone(), next))
        .collect())
}

/// `labels(x)` for node bindings, `type(r)` for the edge binding.
pub fn kinds_of(reference: Expression) -> Expression {
    let name = match &reference {
        Expression::Variable(variable) if variable.symbol == EDGE_SYMBOL => "type",
        _ => "labels",
    };

    FunctionInvocation::new(name, vec![reference]).into()
}

pub fn property(symbol: &str, name: &str) -> Expression {
    PropertyLookup::new(symbol, name).into()
}

pub fn node_property(name: &str) -> Expression {
    property(NODE_SYMBOL, name)
}

pub fn relationship_property(name: &str) -> Expression {
    property(EDGE_SYMBOL, name)
}

pub fn start_property(name: &str) -> Expression {
    property(EDGE_START_SYMBOL, name)
}

pub fn end_property(name: &str) -> Expression {
    property(EDGE_END_SYMBOL, name)
}

pub fn count(reference: Expression) -> Expression {
    FunctionInvocation::new("count", vec![reference]).into()
}

pub fn count_distinct(reference: Expression) -> Expression {
    let mut invocation = FunctionInvocation::new("count", vec![reference]);
    invocation.distinct = true;
    invocation.into()
}

pub fn and(criteria: Vec<Expression>) -> Expression {
    Expression::conjunction(criteria)
}

/// Disjunctions are always parenthesized so they compose under a conjunction.
pub fn or(criteria: Vec<Expression>) -> Expression {
    Expression::parenthetical(Expression::disjunction(criteria))
}

pub fn xor(criteria: Vec<Expression>) -> Expression {
    Expression::ExclusiveDisjunction(crate::cypher::ExpressionList::new(criteria))
}

pub fn not(expression: Expression) -> Expression {
    Expression::Negation(Negation {
        expression: Box::new(expression),
    })
}

pub fn parameter(value: impl Into<Value>) -> Expression {
    Parameter::with_value(value).into()
}

pub fn literal(value: impl Into<Value>) -> Expression {
    Expression::literal(value)
}

fn compare(reference: Expression, operator: Operator, value: Value) -> Expression {
    Comparison::new(reference, operator, parameter(value)).into()
}

pub fn equals(reference: Expression, value: impl Into<Value>) -> Expression {
    compare(reference, Operator::Equals, value.into())
}

pub fn greater_than(reference: Expression, value: impl Into<Value>) -> Expression {
    compare(reference, Operator::GreaterThan, value.into())
}

pub fn greater_than_or_equals(reference: Expression, value: impl Into<Value>) -> Expression {
    compare(reference, Operator::GreaterThanOrEqualTo, value.into())
}

pub fn less_than(reference: Expression, value: impl Into<Value>) -> Expression {
    compare(reference, Operator::LessThan, value.into())
}

pub fn less_than_or_equals(reference: Expression, value: impl Into<Value>) -> Expression {
    compare(reference, Operator::LessThanOrEqualTo, value.into())
}

pub fn after(reference: Expression, value: DateTime<FixedOffset>) -> Expression {
    greater_than(reference, value)
}

pub fn before(reference: Expression, value: DateTime<FixedOffset>) -> Expression {
    less_than(reference, value)
}

pub fn string_contains(reference: Expression, value: &str) -> Expression {
    compare(reference, Operator::Contains, value.into())
}

pub fn string_starts_with(reference: Expression, value: &str) -> Expression {
    compare(reference, Operator::StartsWith, value.into())
}

pub fn string_ends_with(reference: Expression, value: &str) -> Expression {
    compare(reference, Operator::EndsWith, value.into())
}

fn to_lower(reference: Expression) -> Expression {
    FunctionInvocation::new("toLower", vec![reference]).into()
}

pub fn case_insensitive_string_contains(reference: Expression, value: &str) -> Expression {
    string_contains(to_lower(reference), &value.to_lowercase())
}

pub fn case_insensitive_string_starts_with(reference: Expression, value: &str) -> Expression {
    string_starts_with(to_lower(reference), &value.to_lowercase())
}

pub fn case_insensitive_string_ends_with(reference: Expression, value: &str) -> Expression {
    string_ends_with(to_lower(reference), &value.to_lowercase())
}

pub fn in_values(reference: Expression, values: impl Into<Value>) -> Expression {
    compare(reference, Operator::In, values.into())
}

/// Match any of `ids`. A bare variable is wrapped in `id(...)` first.
pub fn in_ids(reference: Expression, ids: Vec<i64>) -> Expression {
    let subject = match reference {
        Expression::FunctionInvocation(_) => reference,
        other => identity(other),
    };

    in_values(subject, ids)
}

pub fn is_null(reference: Expression) -> Expression {
    Comparison::new(reference, Operator::Is, Literal::null().into()).into()
}

pub fn is_not_null(reference: Expression) -> Expression {
    Comparison::new(reference, Operator::IsNot, Literal::null().into()).into()
}

pub fn exists(reference: Expression) -> Expression {
    is_not_null(reference)
}

/// `(x)-[]-()`
pub fn has_relationships(symbol: &str) -> Expression {
    Expression::PatternPredicate(PatternPredicate {
        elements: vec![
            PatternElement::Node(NodePattern {
                binding: Some(Variable::new(symbol)),
                ..Default::default()
            }),
            PatternElement::Relationship(RelationshipPattern {
                direction: Direction::Both,
                ..Default::default()
            }),
            PatternElement::Node(NodePattern::default()),
        ],
    })
}

pub fn where_clause(expression: Expression) -> Criteria {
    Criteria::Where(Where::new(expression))
}

pub fn asc(reference: Expression) -> SortItem {
    SortItem {
        ascending: true,
        expression: reference,
    }
}

pub fn desc(reference: Expression) -> SortItem {
    SortItem {
        ascending: false,
        expression: reference,
    }
}

pub fn order_by(items: Vec<SortItem>) -> Criteria {
    Criteria::Order(Order { items })
}

pub fn limit(value: i64) -> Criteria {
    Criteria::Limit(Limit {
        value: Expression::literal(value),
    })
}

pub fn offset(value: i64) -> Criteria {
    Criteria::Skip(Skip {
        value: Expression::literal(value),
    })
}

pub fn returning(items: Vec<Expression>) -> Criteria {
    Criteria::Return(Return {
        projection: Projection {
            items: items
                .into_iter()
                .map(|expression| ProjectionItem {
                    expression,
                    binding: None,
                })
                .collect(),
            ..Default::default()
        },
    })
}

pub fn returning_distinct(items: Vec<Expression>) -> Criteria {
    let mut criteria = returning(items);

    if let Criteria::Return(return_clause) = &mut criteria {
        return_clause.projection.distinct = true;
    }

    criteria
}

/// Deleting only node bindings detaches them from their edges.
pub fn delete(references: Vec<Expression>) -> Criteria {
    let detach = !references.iter().any(|reference| {
        matches!(reference, Expression::Variable(variable)
            if [EDGE_SYMBOL, EDGE_START_SYMBOL, EDGE_END_SYMBOL].contains(&variable.symbol.as_str()))
    });

    Criteria::Update(UpdatingClause::Delete(Delete {
        detach,
        expressions: references,
    }))
}

fn set_items(items: Vec<SetItem>) -> Criteria {
    Criteria::Update(UpdatingClause::Set(Set { items }))
}

fn remove_items(items: Vec<RemoveItem>) -> Criteria {
    Criteria::Update(UpdatingClause::Remove(Remove { items }))
}

pub fn add_kind(reference: Expression, kind: impl Into<Kind>) -> Criteria {
    add_kinds(reference, vec![kind.into()])
}

pub fn add_kinds(reference: Expression, kinds: Vec<Kind>) -> Criteria {
    set_items(vec![SetItem {
        left: reference.clone(),
        operator: AssignmentOperator::LabelAssign,
        right: KindMatcher::new(reference, kinds).into(),
    }])
}

pub fn delete_kind(reference: Expression, kind: impl Into<Kind>) -> Criteria {
    delete_kinds(reference, vec![kind.into()])
}

pub fn delete_kinds(reference: Expression, kinds: Vec<Kind>) -> Criteria {
    remove_items(vec![RemoveItem {
        expression: KindMatcher::new(reference, kinds).into(),
    }])
}

/// `set x.p = $value` where `lookup` is `x.p`.
pub fn set_property(lookup: Expression, value: impl Into<Value>) -> Criteria {
    set_items(vec![SetItem {
        left: lookup,
        operator: AssignmentOperator::Assign,
        right: parameter(value),
    }])
}

pub fn set_properties(symbol: &str, properties: BTreeMap<String, Value>) -> Criteria {
    set_items(
        properties
            .into_iter()
            .map(|(key, value)| SetItem {
                left: property(symbol, &key),
                operator: AssignmentOperator::Assign,
                right: parameter(value),
            })
            .collect(),
    )
}

pub fn delete_property(lookup: Expression) -> Criteria {
    remove_items(vec![RemoveItem { expression: lookup }])
}

pub fn delete_properties(symbol: &str, names: &[&str]) -> Criteria {
    remove_items(
        names
            .iter()
            .map(|name| RemoveItem {
                expression: property(symbol, name),
            })
            .collect(),
    )
}

fn bound_node_pattern(symbol: &str, kinds: Vec<Kind>, properties: Option<Parameter>) -> PatternElement {
    PatternElement::Node(NodePattern {
        binding: Some(Variable::new(symbol)),
        kinds,
        properties: properties.map(crate::cypher::Properties::Parameter),
    })
}

pub fn node_pattern(kinds: Vec<Kind>, properties: Option<Parameter>) -> PatternElement {
    bound_node_pattern(NODE_SYMBOL, kinds, properties)
}

pub fn start_node_pattern(kinds: Vec<Kind>, properties: Option<Parameter>) -> PatternElement {
    bound_node_pattern(EDGE_START_SYMBOL, kinds, properties)
}

pub fn end_node_pattern(kinds: Vec<Kind>, properties: Option<Parameter>) -> PatternElement {
    bound_node_pattern(EDGE_END_SYMBOL, kinds, properties)
}

pub fn relationship_pattern(
    kind: impl Into<Kind>,
    properties: Option<Parameter>,
    direction: Direction,
) -> PatternElement {
    PatternElement::Relationship(RelationshipPattern {
        binding: Some(Variable::new(EDGE_SYMBOL)),
        kinds: vec![kind.into()],
        direction,
        range: None,
        properties: properties.map(crate::cypher::Properties::Parameter),
    })
}

pub fn create(elements: Vec<PatternElement>) -> Criteria {
    Criteria::Update(UpdatingClause::Create(Create {
        unique: false,
        pattern: vec![PatternPart {
            elements,
            ..Default::default()
        }],
    }))
}
