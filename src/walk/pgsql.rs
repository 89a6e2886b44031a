//! Borrowed handles and the cursor constructor for the PostgreSQL syntax tree.

use crate::pgsql::ast::{
    Assignment, CommonTableExpression, Expression, FromClause, Join, MatchedAction, MergeAction,
    NotMatchedAction, OrderBy, Query, Select, SetExpression, Statement,
};

use super::errors::WalkError;
use super::Cursor;

#[derive(Debug, Clone, Copy)]
pub enum PgNode<'a> {
    Statement(&'a Statement),
    Query(&'a Query),
    CommonTableExpression(&'a CommonTableExpression),
    SetExpression(&'a SetExpression),
    Select(&'a Select),
    FromClause(&'a FromClause),
    Join(&'a Join),
    OrderBy(&'a OrderBy),
    Assignment(&'a Assignment),
    MergeAction(&'a MergeAction),
    Expression(&'a Expression),
}

impl<'a> PgNode<'a> {
    pub fn node_type(&self) -> &'static str {
        match self {
            PgNode::Statement(statement) => statement.node_type(),
            PgNode::Query(_) => "Query",
            PgNode::CommonTableExpression(_) => "CommonTableExpression",
            PgNode::SetExpression(SetExpression::Select(_)) => "Select",
            PgNode::SetExpression(SetExpression::SetOperation(_)) => "SetOperation",
            PgNode::SetExpression(SetExpression::Values(_)) => "Values",
            PgNode::SetExpression(SetExpression::Query(_)) => "Query",
            PgNode::Select(_) => "Select",
            PgNode::FromClause(_) => "FromClause",
            PgNode::Join(_) => "Join",
            PgNode::OrderBy(_) => "OrderBy",
            PgNode::Assignment(_) => "Assignment",
            PgNode::MergeAction(_) => "MergeAction",
            PgNode::Expression(expression) => expression.node_type(),
        }
    }
}

fn query_branches<'a>(query: &'a Query, branches: &mut Vec<PgNode<'a>>) {
    if let Some(with) = &query.with {
        branches.extend(with.expressions.iter().map(PgNode::CommonTableExpression));
    }

    branches.push(PgNode::SetExpression(&query.body));
    branches.extend(query.order_by.iter().map(PgNode::OrderBy));
    branches.extend(query.offset.iter().map(PgNode::Expression));
    branches.extend(query.limit.iter().map(PgNode::Expression));
}

fn expression_branches<'a>(expression: &'a Expression, branches: &mut Vec<PgNode<'a>>) {
    match expression {
        Expression::Identifier(_)
        | Expression::CompoundIdentifier(_)
        | Expression::Literal(_)
        | Expression::AnnotatedLiteral { .. }
        | Expression::Parameter(_)
        | Expression::AnnotatedParameter { .. }
        | Expression::Wildcard
        | Expression::Entity { .. }
        | Expression::KindReference { .. }
        | Expression::PropertyLookup { .. }
        | Expression::AnnotatedPropertyLookup { .. }
        | Expression::AnnotatedKindMatcher { .. } => {}
        Expression::Binary(binary) => {
            branches.push(PgNode::Expression(&binary.left));
            branches.push(PgNode::Expression(&binary.right));
        }
        Expression::Unary(unary) => branches.push(PgNode::Expression(&unary.operand)),
        Expression::Parenthetical(inner) | Expression::Any(inner) => {
            branches.push(PgNode::Expression(inner))
        }
        Expression::FunctionCall(call) => {
            branches.extend(call.arguments.iter().map(PgNode::Expression))
        }
        Expression::ArrayLiteral(values) | Expression::CompositeValue { values, .. } => {
            branches.extend(values.iter().map(PgNode::Expression))
        }
        Expression::TypeCast { expression, .. } | Expression::Aliased { expression, .. } => {
            branches.push(PgNode::Expression(expression))
        }
        Expression::Exists(query) => branches.push(PgNode::Query(query)),
    }
}

/// Enumerate the direct children of a target node.
pub fn pgsql_cursor(node: PgNode<'_>) -> Result<Cursor<PgNode<'_>>, WalkError> {
    let mut branches = Vec::new();

    match node {
        PgNode::Statement(statement) => match statement {
            Statement::Query(query) => branches.push(PgNode::Query(query)),
            Statement::Insert(insert) => {
                branches.push(PgNode::Query(&insert.source));
                branches.extend(insert.returning.iter().map(PgNode::Expression));
            }
            Statement::Update(update) => {
                branches.extend(update.assignments.iter().map(PgNode::Assignment));
                branches.extend(update.from.iter().map(PgNode::FromClause));
                branches.extend(update.where_clause.iter().map(PgNode::Expression));
                branches.extend(update.returning.iter().map(PgNode::Expression));
            }
            Statement::Delete(delete) => {
                branches.extend(delete.using.iter().map(PgNode::FromClause));
                branches.extend(delete.where_clause.iter().map(PgNode::Expression));
                branches.extend(delete.returning.iter().map(PgNode::Expression));
            }
            Statement::Merge(merge) => {
                branches.push(PgNode::Expression(&merge.on));
                branches.extend(merge.actions.iter().map(PgNode::MergeAction));
            }
        },
        PgNode::Query(query) => query_branches(query, &mut branches),
        PgNode::CommonTableExpression(cte) => branches.push(PgNode::Query(&cte.query)),
        PgNode::SetExpression(set_expression) => match set_expression {
            SetExpression::Select(select) => branches.push(PgNode::Select(select)),
            SetExpression::SetOperation(operation) => {
                branches.push(PgNode::SetExpression(&operation.lhs));
                branches.push(PgNode::SetExpression(&operation.rhs));
            }
            SetExpression::Values(values) => {
                for row in &values.rows {
                    branches.extend(row.iter().map(PgNode::Expression));
                }
            }
            SetExpression::Query(query) => branches.push(PgNode::Query(query)),
        },
        PgNode::Select(select) => {
            branches.extend(select.projection.iter().map(PgNode::Expression));
            branches.extend(select.from.iter().map(PgNode::FromClause));
            branches.extend(select.where_clause.iter().map(PgNode::Expression));
            branches.extend(select.group_by.iter().map(PgNode::Expression));
            branches.extend(select.having.iter().map(PgNode::Expression));
        }
        PgNode::FromClause(from) => branches.extend(from.joins.iter().map(PgNode::Join)),
        PgNode::Join(join) => branches.push(PgNode::Expression(&join.operator.constraint)),
        PgNode::OrderBy(order_by) => branches.push(PgNode::Expression(&order_by.expression)),
        PgNode::Assignment(assignment) => branches.push(PgNode::Expression(&assignment.value)),
        PgNode::MergeAction(action) => {
            let predicate = match action {
                MergeAction::Matched { predicate, .. } | MergeAction::NotMatched { predicate, .. } => {
                    predicate
                }
            };

            branches.extend(predicate.iter().map(PgNode::Expression));

            match action {
                MergeAction::Matched {
                    action: MatchedAction::Update(assignments),
                    ..
                } => branches.extend(assignments.iter().map(PgNode::Assignment)),
                MergeAction::NotMatched {
                    action: NotMatchedAction::Insert { values, .. },
                    ..
                } => branches.extend(values.iter().map(PgNode::Expression)),
                _ => {}
            }
        }
        PgNode::Expression(expression) => expression_branches(expression, &mut branches),
    }

    Ok(Cursor::new(node, branches))
}
