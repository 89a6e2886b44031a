//! Borrowed handles over the source syntax tree
//!
//! [`CypherNode`] is a `Copy` view used by read-only walks; [`CypherNodeMut`] is the mutable
//! counterpart consumed by rewrite walks. Both are transparent over the reading clause, updating
//! clause and pattern element enums so that walkers see the concrete clause or pattern directly.
//!
//! Branches are listed in grammar order with one exception: a match clause yields its where
//! clause before its pattern, so anything bound inside the predicate is seen first.

use super::ast::{
    Create, Delete, Expression, Limit, Match, MultiPartQuery, MultiPartQueryPart, NodePattern,
    Order, PartialArithmetic, PartialComparison, PatternElement, PatternPart, Projection,
    ProjectionItem, Properties, ReadingClause, RegularQuery, RelationshipPattern, Remove,
    RemoveItem, Return, Set, SetItem, SingleQuery, SinglePartQuery, Skip, SortItem, Unwind,
    UpdatingClause, Where, With,
};

#[derive(Debug, Clone, Copy)]
pub enum CypherNode<'a> {
    RegularQuery(&'a RegularQuery),
    SinglePartQuery(&'a SinglePartQuery),
    MultiPartQuery(&'a MultiPartQuery),
    MultiPartQueryPart(&'a MultiPartQueryPart),
    Match(&'a Match),
    Where(&'a Where),
    Unwind(&'a Unwind),
    Create(&'a Create),
    Delete(&'a Delete),
    Set(&'a Set),
    SetItem(&'a SetItem),
    Remove(&'a Remove),
    RemoveItem(&'a RemoveItem),
    With(&'a With),
    Return(&'a Return),
    Projection(&'a Projection),
    ProjectionItem(&'a ProjectionItem),
    Order(&'a Order),
    SortItem(&'a SortItem),
    Skip(&'a Skip),
    Limit(&'a Limit),
    PatternPart(&'a PatternPart),
    NodePattern(&'a NodePattern),
    RelationshipPattern(&'a RelationshipPattern),
    Properties(&'a Properties),
    Expression(&'a Expression),
    PartialComparison(&'a PartialComparison),
    PartialArithmetic(&'a PartialArithmetic),
}

#[derive(Debug)]
pub enum CypherNodeMut<'a> {
    RegularQuery(&'a mut RegularQuery),
    SinglePartQuery(&'a mut SinglePartQuery),
    MultiPartQuery(&'a mut MultiPartQuery),
    MultiPartQueryPart(&'a mut MultiPartQueryPart),
    Match(&'a mut Match),
    Where(&'a mut Where),
    Unwind(&'a mut Unwind),
    Create(&'a mut Create),
    Delete(&'a mut Delete),
    Set(&'a mut Set),
    SetItem(&'a mut SetItem),
    Remove(&'a mut Remove),
    RemoveItem(&'a mut RemoveItem),
    With(&'a mut With),
    Return(&'a mut Return),
    Projection(&'a mut Projection),
    ProjectionItem(&'a mut ProjectionItem),
    Order(&'a mut Order),
    SortItem(&'a mut SortItem),
    Skip(&'a mut Skip),
    Limit(&'a mut Limit),
    PatternPart(&'a mut PatternPart),
    NodePattern(&'a mut NodePattern),
    RelationshipPattern(&'a mut RelationshipPattern),
    Properties(&'a mut Properties),
    Expression(&'a mut Expression),
    PartialComparison(&'a mut PartialComparison),
    PartialArithmetic(&'a mut PartialArithmetic),
}

macro_rules! node_type_names {
    ($node:expr, $handle:ident) => {
        match $node {
            $handle::RegularQuery(_) => "RegularQuery",
            $handle::SinglePartQuery(_) => "SinglePartQuery",
            $handle::MultiPartQuery(_) => "MultiPartQuery",
            $handle::MultiPartQueryPart(_) => "MultiPartQueryPart",
            $handle::Match(_) => "Match",
            $handle::Where(_) => "Where",
            $handle::Unwind(_) => "Unwind",
            $handle::Create(_) => "Create",
            $handle::Delete(_) => "Delete",
            $handle::Set(_) => "Set",
            $handle::SetItem(_) => "SetItem",
            $handle::Remove(_) => "Remove",
            $handle::RemoveItem(_) => "RemoveItem",
            $handle::With(_) => "With",
            $handle::Return(_) => "Return",
            $handle::Projection(_) => "Projection",
            $handle::ProjectionItem(_) => "ProjectionItem",
            $handle::Order(_) => "Order",
            $handle::SortItem(_) => "SortItem",
            $handle::Skip(_) => "Skip",
            $handle::Limit(_) => "Limit",
            $handle::PatternPart(_) => "PatternPart",
            $handle::NodePattern(_) => "NodePattern",
            $handle::RelationshipPattern(_) => "RelationshipPattern",
            $handle::Properties(_) => "Properties",
            $handle::Expression(expression) => expression.node_type(),
            $handle::PartialComparison(_) => "PartialComparison",
            $handle::PartialArithmetic(_) => "PartialArithmetic",
        }
    };
}

impl<'a> CypherNode<'a> {
    pub fn node_type(&self) -> &'static str {
        node_type_names!(self, CypherNode)
    }

    pub fn from_reading_clause(clause: &'a ReadingClause) -> Self {
        match clause {
            ReadingClause::Match(match_clause) => CypherNode::Match(match_clause),
            ReadingClause::Unwind(unwind) => CypherNode::Unwind(unwind),
        }
    }

    pub fn from_updating_clause(clause: &'a UpdatingClause) -> Self {
        match clause {
            UpdatingClause::Create(create) => CypherNode::Create(create),
            UpdatingClause::Delete(delete) => CypherNode::Delete(delete),
            UpdatingClause::Set(set) => CypherNode::Set(set),
            UpdatingClause::Remove(remove) => CypherNode::Remove(remove),
        }
    }

    pub fn from_pattern_element(element: &'a PatternElement) -> Self {
        match element {
            PatternElement::Node(node) => CypherNode::NodePattern(node),
            PatternElement::Relationship(relationship) => {
                CypherNode::RelationshipPattern(relationship)
            }
        }
    }

    /// Direct children in walk order.
    pub fn branches(&self) -> Vec<CypherNode<'a>> {
        let mut branches = Vec::new();

        match *self {
            CypherNode::RegularQuery(query) => match &query.single_query {
                SingleQuery::SinglePart(part) => branches.push(CypherNode::SinglePartQuery(part)),
                SingleQuery::MultiPart(multi) => branches.push(CypherNode::MultiPartQuery(multi)),
            },
            CypherNode::SinglePartQuery(query) => {
                branches.extend(query.reading_clauses.iter().map(Self::from_reading_clause));
                branches.extend(query.updating_clauses.iter().map(Self::from_updating_clause));
                branches.extend(query.return_clause.iter().map(CypherNode::Return));
            }
            CypherNode::MultiPartQuery(query) => {
                branches.extend(query.parts.iter().map(CypherNode::MultiPartQueryPart));
                branches.push(CypherNode::SinglePartQuery(&query.single_part_query));
            }
            CypherNode::MultiPartQueryPart(part) => {
                branches.extend(part.reading_clauses.iter().map(Self::from_reading_clause));
                branches.extend(part.updating_clauses.iter().map(Self::from_updating_clause));
                branches.push(CypherNode::With(&part.with));
            }
            CypherNode::Match(match_clause) => {
                branches.extend(match_clause.where_clause.iter().map(CypherNode::Where));
                branches.extend(match_clause.pattern.iter().map(CypherNode::PatternPart));
            }
            CypherNode::Where(where_clause) => {
                branches.extend(where_clause.expressions.iter().map(CypherNode::Expression));
            }
            CypherNode::Unwind(unwind) => branches.push(CypherNode::Expression(&unwind.expression)),
            CypherNode::Create(create) => {
                branches.extend(create.pattern.iter().map(CypherNode::PatternPart));
            }
            CypherNode::Delete(delete) => {
                branches.extend(delete.expressions.iter().map(CypherNode::Expression));
            }
            CypherNode::Set(set) => branches.extend(set.items.iter().map(CypherNode::SetItem)),
            CypherNode::SetItem(item) => {
                branches.push(CypherNode::Expression(&item.left));
                branches.push(CypherNode::Expression(&item.right));
            }
            CypherNode::Remove(remove) => {
                branches.extend(remove.items.iter().map(CypherNode::RemoveItem));
            }
            CypherNode::RemoveItem(item) => branches.push(CypherNode::Expression(&item.expression)),
            CypherNode::With(with) => {
                branches.push(CypherNode::Projection(&with.projection));
                branches.extend(with.where_clause.iter().map(CypherNode::Where));
            }
            CypherNode::Return(return_clause) => {
                branches.push(CypherNode::Projection(&return_clause.projection));
            }
            CypherNode::Projection(projection) => {
                branches.extend(projection.items.iter().map(CypherNode::ProjectionItem));
                branches.extend(projection.order.iter().map(CypherNode::Order));
                branches.extend(projection.skip.iter().map(CypherNode::Skip));
                branches.extend(projection.limit.iter().map(CypherNode::Limit));
            }
            CypherNode::ProjectionItem(item) => {
                branches.push(CypherNode::Expression(&item.expression));
            }
            CypherNode::Order(order) => {
                branches.extend(order.items.iter().map(CypherNode::SortItem));
            }
            CypherNode::SortItem(item) => branches.push(CypherNode::Expression(&item.expression)),
            CypherNode::Skip(skip) => branches.push(CypherNode::Expression(&skip.value)),
            CypherNode::Limit(limit) => branches.push(CypherNode::Expression(&limit.value)),
            CypherNode::PatternPart(part) => {
                branches.extend(part.elements.iter().map(Self::from_pattern_element));
            }
            CypherNode::NodePattern(node) => {
                branches.extend(node.properties.iter().map(CypherNode::Properties));
            }
            CypherNode::RelationshipPattern(relationship) => {
                branches.extend(relationship.properties.iter().map(CypherNode::Properties));
            }
            CypherNode::Properties(properties) => {
                if let Properties::Map(map) = properties {
                    branches.extend(map.entries.values().map(CypherNode::Expression));
                }
            }
            CypherNode::Expression(expression) => expression_branches(expression, &mut branches),
            CypherNode::PartialComparison(partial) => {
                branches.push(CypherNode::Expression(&partial.right));
            }
            CypherNode::PartialArithmetic(partial) => {
                branches.push(CypherNode::Expression(&partial.right));
            }
        }

        branches
    }
}

fn expression_branches<'a>(expression: &'a Expression, branches: &mut Vec<CypherNode<'a>>) {
    match expression {
        Expression::Variable(_) | Expression::Parameter(_) | Expression::Literal(_) => {}
        Expression::List(list) => branches.extend(list.items.iter().map(CypherNode::Expression)),
        Expression::Map(map) => branches.extend(map.entries.values().map(CypherNode::Expression)),
        Expression::PropertyLookup(lookup) => branches.push(CypherNode::Expression(&lookup.atom)),
        Expression::FunctionInvocation(invocation) => {
            branches.extend(invocation.arguments.iter().map(CypherNode::Expression));
        }
        Expression::KindMatcher(matcher) => {
            branches.push(CypherNode::Expression(&matcher.reference));
        }
        Expression::Comparison(comparison) => {
            branches.push(CypherNode::Expression(&comparison.left));
            branches.extend(comparison.partials.iter().map(CypherNode::PartialComparison));
        }
        Expression::Arithmetic(arithmetic) => {
            branches.push(CypherNode::Expression(&arithmetic.left));
            branches.extend(arithmetic.partials.iter().map(CypherNode::PartialArithmetic));
        }
        Expression::Negation(negation) => {
            branches.push(CypherNode::Expression(&negation.expression));
        }
        Expression::Parenthetical(parenthetical) => {
            branches.push(CypherNode::Expression(&parenthetical.expression));
        }
        Expression::Conjunction(list)
        | Expression::Disjunction(list)
        | Expression::ExclusiveDisjunction(list) => {
            branches.extend(list.expressions.iter().map(CypherNode::Expression));
        }
        Expression::PatternPredicate(predicate) => {
            branches.extend(predicate.elements.iter().map(CypherNode::from_pattern_element));
        }
    }
}

impl<'a> CypherNodeMut<'a> {
    pub fn node_type(&self) -> &'static str {
        node_type_names!(self, CypherNodeMut)
    }

    pub fn from_reading_clause(clause: &'a mut ReadingClause) -> Self {
        match clause {
            ReadingClause::Match(match_clause) => CypherNodeMut::Match(match_clause),
            ReadingClause::Unwind(unwind) => CypherNodeMut::Unwind(unwind),
        }
    }

    pub fn from_updating_clause(clause: &'a mut UpdatingClause) -> Self {
        match clause {
            UpdatingClause::Create(create) => CypherNodeMut::Create(create),
            UpdatingClause::Delete(delete) => CypherNodeMut::Delete(delete),
            UpdatingClause::Set(set) => CypherNodeMut::Set(set),
            UpdatingClause::Remove(remove) => CypherNodeMut::Remove(remove),
        }
    }

    pub fn from_pattern_element(element: &'a mut PatternElement) -> Self {
        match element {
            PatternElement::Node(node) => CypherNodeMut::NodePattern(node),
            PatternElement::Relationship(relationship) => {
                CypherNodeMut::RelationshipPattern(relationship)
            }
        }
    }

    /// Consume the handle into handles over its direct children, in the same order as
    /// [`CypherNode::branches`].
    pub fn into_branches(self) -> Vec<CypherNodeMut<'a>> {
        let mut branches = Vec::new();

        match self {
            CypherNodeMut::RegularQuery(query) => match &mut query.single_query {
                SingleQuery::SinglePart(part) => {
                    branches.push(CypherNodeMut::SinglePartQuery(part))
                }
                SingleQuery::MultiPart(multi) => {
                    branches.push(CypherNodeMut::MultiPartQuery(multi))
                }
            },
            CypherNodeMut::SinglePartQuery(query) => {
                branches.extend(
                    query
                        .reading_clauses
                        .iter_mut()
                        .map(Self::from_reading_clause),
                );
                branches.extend(
                    query
                        .updating_clauses
                        .iter_mut()
                        .map(Self::from_updating_clause),
                );
                branches.extend(query.return_clause.iter_mut().map(CypherNodeMut::Return));
            }
            CypherNodeMut::MultiPartQuery(query) => {
                branches.extend(query.parts.iter_mut().map(CypherNodeMut::MultiPartQueryPart));
                branches.push(CypherNodeMut::SinglePartQuery(&mut query.single_part_query));
            }
            CypherNodeMut::MultiPartQueryPart(part) => {
                branches.extend(part.reading_clauses.iter_mut().map(Self::from_reading_clause));
                branches.extend(
                    part.updating_clauses
                        .iter_mut()
                        .map(Self::from_updating_clause),
                );
                branches.push(CypherNodeMut::With(&mut part.with));
            }
            CypherNodeMut::Match(match_clause) => {
                branches.extend(match_clause.where_clause.iter_mut().map(CypherNodeMut::Where));
                branches.extend(match_clause.pattern.iter_mut().map(CypherNodeMut::PatternPart));
            }
            CypherNodeMut::Where(where_clause) => {
                branches.extend(
                    where_clause
                        .expressions
                        .iter_mut()
                        .map(CypherNodeMut::Expression),
                );
            }
            CypherNodeMut::Unwind(unwind) => {
                branches.push(CypherNodeMut::Expression(&mut unwind.expression))
            }
            CypherNodeMut::Create(create) => {
                branches.extend(create.pattern.iter_mut().map(CypherNodeMut::PatternPart));
            }
            CypherNodeMut::Delete(delete) => {
                branches.extend(delete.expressions.iter_mut().map(CypherNodeMut::Expression));
            }
            CypherNodeMut::Set(set) => {
                branches.extend(set.items.iter_mut().map(CypherNodeMut::SetItem))
            }
            CypherNodeMut::SetItem(item) => {
                branches.push(CypherNodeMut::Expression(&mut item.left));
                branches.push(CypherNodeMut::Expression(&mut item.right));
            }
            CypherNodeMut::Remove(remove) => {
                branches.extend(remove.items.iter_mut().map(CypherNodeMut::RemoveItem));
            }
            CypherNodeMut::RemoveItem(item) => {
                branches.push(CypherNodeMut::Expression(&mut item.expression))
            }
            CypherNodeMut::With(with) => {
                branches.push(CypherNodeMut::Projection(&mut with.projection));
                branches.extend(with.where_clause.iter_mut().map(CypherNodeMut::Where));
            }
            CypherNodeMut::Return(return_clause) => {
                branches.push(CypherNodeMut::Projection(&mut return_clause.projection));
            }
            CypherNodeMut::Projection(projection) => {
                branches.extend(
                    projection
                        .items
                        .iter_mut()
                        .map(CypherNodeMut::ProjectionItem),
                );
                branches.extend(projection.order.iter_mut().map(CypherNodeMut::Order));
                branches.extend(projection.skip.iter_mut().map(CypherNodeMut::Skip));
                branches.extend(projection.limit.iter_mut().map(CypherNodeMut::Limit));
            }
            CypherNodeMut::ProjectionItem(item) => {
                branches.push(CypherNodeMut::Expression(&mut item.expression));
            }
            CypherNodeMut::Order(order) => {
                branches.extend(order.items.iter_mut().map(CypherNodeMut::SortItem));
            }
            CypherNodeMut::SortItem(item) => {
                branches.push(CypherNodeMut::Expression(&mut item.expression))
            }
            CypherNodeMut::Skip(skip) => branches.push(CypherNodeMut::Expression(&mut skip.value)),
            CypherNodeMut::Limit(limit) => {
                branches.push(CypherNodeMut::Expression(&mut limit.value))
            }
            CypherNodeMut::PatternPart(part) => {
                branches.extend(part.elements.iter_mut().map(Self::from_pattern_element));
            }
            CypherNodeMut::NodePattern(node) => {
                branches.extend(node.properties.iter_mut().map(CypherNodeMut::Properties));
            }
            CypherNodeMut::RelationshipPattern(relationship) => {
                branches.extend(
                    relationship
                        .properties
                        .iter_mut()
                        .map(CypherNodeMut::Properties),
                );
            }
            CypherNodeMut::Properties(properties) => {
                if let Properties::Map(map) = properties {
                    branches.extend(map.entries.values_mut().map(CypherNodeMut::Expression));
                }
            }
            CypherNodeMut::Expression(expression) => {
                expression_branches_mut(expression, &mut branches)
            }
            CypherNodeMut::PartialComparison(partial) => {
                branches.push(CypherNodeMut::Expression(&mut partial.right));
            }
            CypherNodeMut::PartialArithmetic(partial) => {
                branches.push(CypherNodeMut::Expression(&mut partial.right));
            }
        }

        branches
    }
}

fn expression_branches_mut<'a>(
    expression: &'a mut Expression,
    branches: &mut Vec<CypherNodeMut<'a>>,
) {
    match expression {
        Expression::Variable(_) | Expression::Parameter(_) | Expression::Literal(_) => {}
        Expression::List(list) => {
            branches.extend(list.items.iter_mut().map(CypherNodeMut::Expression))
        }
        Expression::Map(map) => {
            branches.extend(map.entries.values_mut().map(CypherNodeMut::Expression))
        }
        Expression::PropertyLookup(lookup) => {
            branches.push(CypherNodeMut::Expression(&mut lookup.atom))
        }
        Expression::FunctionInvocation(invocation) => {
            branches.extend(
                invocation
                    .arguments
                    .iter_mut()
                    .map(CypherNodeMut::Expression),
            );
        }
        Expression::KindMatcher(matcher) => {
            branches.push(CypherNodeMut::Expression(&mut matcher.reference));
        }
        Expression::Comparison(comparison) => {
            branches.push(CypherNodeMut::Expression(&mut comparison.left));
            branches.extend(
                comparison
                    .partials
                    .iter_mut()
                    .map(CypherNodeMut::PartialComparison),
            );
        }
        Expression::Arithmetic(arithmetic) => {
            branches.push(CypherNodeMut::Expression(&mut arithmetic.left));
            branches.extend(
                arithmetic
                    .partials
                    .iter_mut()
                    .map(CypherNodeMut::PartialArithmetic),
            );
        }
        Expression::Negation(negation) => {
            branches.push(CypherNodeMut::Expression(&mut negation.expression));
        }
        Expression::Parenthetical(parenthetical) => {
            branches.push(CypherNodeMut::Expression(&mut parenthetical.expression));
        }
        Expression::Conjunction(list)
        | Expression::Disjunction(list)
        | Expression::ExclusiveDisjunction(list) => {
            branches.extend(list.expressions.iter_mut().map(CypherNodeMut::Expression));
        }
        Expression::PatternPredicate(predicate) => {
            branches.extend(
                predicate
                    .elements
                    .iter_mut()
                    .map(CypherNodeMut::from_pattern_element),
            );
        }
    }
}
