use std::collections::BTreeSet;

use crate::cypher::{
    CypherNode, Direction, Limit, Match, NodePattern, Order, PatternElement, PatternPart,
    ReadingClause, RegularQuery, RelationshipPattern, Return, SinglePartQuery, Skip,
    UpdatingClause, Variable, Where,
};
use crate::walk::cypher::referenced_variables;
use crate::walk::cypher_cursor;

use super::errors::QueryBuilderError;
use super::{EDGE_END_SYMBOL, EDGE_START_SYMBOL, EDGE_SYMBOL, NODE_SYMBOL};

/// One piece of a query handed to a [`QueryBuilder`].
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    Where(Where),
    Update(UpdatingClause),
    Return(Return),
    Order(Order),
    Skip(Skip),
    Limit(Limit),
}

impl From<Where> for Criteria {
    fn from(where_clause: Where) -> Self {
        Criteria::Where(where_clause)
    }
}

impl From<UpdatingClause> for Criteria {
    fn from(clause: UpdatingClause) -> Self {
        Criteria::Update(clause)
    }
}

impl From<Return> for Criteria {
    fn from(return_clause: Return) -> Self {
        Criteria::Return(return_clause)
    }
}

/// Assembles a single-part query from loose criteria.
///
/// The match pattern is inferred from the bindings the criteria reference: `(n)` for node
/// criteria, `(s)-[r]->(e)` for relationship criteria with unreferenced positions left
/// anonymous. Bindings introduced by a `create` do not count as references.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    criteria: Vec<Criteria>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_criteria<I>(criteria: I) -> Self
    where
        I: IntoIterator<Item = Criteria>,
    {
        QueryBuilder {
            criteria: criteria.into_iter().collect(),
        }
    }

    pub fn apply(&mut self, criteria: impl Into<Criteria>) -> &mut Self {
        self.criteria.push(criteria.into());
        self
    }

    pub fn build(&self) -> Result<RegularQuery, QueryBuilderError> {
        let mut where_expressions = Vec::new();
        let mut updating_clauses = Vec::new();
        let mut return_clause: Option<Return> = None;
        let mut order = None;
        let mut skip = None;
        let mut limit = None;

        for criteria in &self.criteria {
            match criteria {
                Criteria::Where(where_clause) => {
                    where_expressions.extend(where_clause.expressions.iter().cloned())
                }
                Criteria::Update(clause) => updating_clauses.push(clause.clone()),
                Criteria::Return(next) => {
                    if return_clause.replace(next.clone()).is_some() {
                        return Err(QueryBuilderError::DuplicateReturn);
                    }
                }
                Criteria::Order(next) => order = Some(next.clone()),
                Criteria::Skip(next) => skip = Some(next.clone()),
                Criteria::Limit(next) => limit = Some(next.clone()),
            }
        }

        if let Some(return_clause) = &mut return_clause {
            let projection = &mut return_clause.projection;
            projection.order = order.or(projection.order.take());
            projection.skip = skip.or(projection.skip.take());
            projection.limit = limit.or(projection.limit.take());
        } else if order.is_some() {
            return Err(QueryBuilderError::MissingReturn("order by"));
        } else if skip.is_some() {
            return Err(QueryBuilderError::MissingReturn("skip"));
        } else if limit.is_some() {
            return Err(QueryBuilderError::MissingReturn("limit"));
        }

        let where_clause = (!where_expressions.is_empty()).then_some(Where {
            expressions: where_expressions,
        });

        let references = self.references(where_clause.as_ref(), &updating_clauses, return_clause.as_ref())?;
        let creates_only = !updating_clauses.is_empty()
            && updating_clauses
                .iter()
                .all(|clause| matches!(clause, UpdatingClause::Create(_)));

        let mut reading_clauses = Vec::new();

        match match_pattern(&references)? {
            Some(elements) => reading_clauses.push(ReadingClause::Match(Match {
                optional: false,
                pattern: vec![PatternPart {
                    elements,
                    ..Default::default()
                }],
                where_clause,
            })),
            None if creates_only && where_clause.is_none() => {}
            None => return Err(QueryBuilderError::NoBindings),
        }

        Ok(RegularQuery::single_part(SinglePartQuery {
            reading_clauses,
            updating_clauses,
            return_clause,
        }))
    }

    fn references(
        &self,
        where_clause: Option<&Where>,
        updating_clauses: &[UpdatingClause],
        return_clause: Option<&Return>,
    ) -> Result<BTreeSet<String>, QueryBuilderError> {
        let mut references = BTreeSet::new();
        let mut created = BTreeSet::new();

        if let Some(where_clause) = where_clause {
            references.extend(referenced_variables(CypherNode::Where(where_clause), cypher_cursor)?);
        }

        for clause in updating_clauses {
            let symbols = referenced_variables(CypherNode::from_updating_clause(clause), cypher_cursor)?;

            match clause {
                UpdatingClause::Create(_) => created.extend(symbols),
                _ => references.extend(symbols),
            }
        }

        if let Some(return_clause) = return_clause {
            references.extend(referenced_variables(CypherNode::Return(return_clause), cypher_cursor)?);
        }

        Ok(references.difference(&created).cloned().collect())
    }
}

fn match_pattern(references: &BTreeSet<String>) -> Result<Option<Vec<PatternElement>>, QueryBuilderError> {
    let binding = |symbol: &str| references.contains(symbol).then(|| Variable::new(symbol));

    let node_referenced = references.contains(NODE_SYMBOL);
    let relationship_referenced = [EDGE_START_SYMBOL, EDGE_SYMBOL, EDGE_END_SYMBOL]
        .iter()
        .any(|symbol| references.contains(*symbol));

    match (node_referenced, relationship_referenced) {
        (true, true) => Err(QueryBuilderError::MixedBindings),
        (true, false) => Ok(Some(vec![PatternElement::Node(NodePattern {
            binding: binding(NODE_SYMBOL),
            ..Default::default()
        })])),
        (false, true) => Ok(Some(vec![
            PatternElement::Node(NodePattern {
                binding: binding(EDGE_START_SYMBOL),
                ..Default::default()
            }),
            PatternElement::Relationship(RelationshipPattern {
                binding: binding(EDGE_SYMBOL),
                direction: Direction::Outbound,
                ..Default::default()
            }),
            PatternElement::Node(NodePattern {
                binding: binding(EDGE_END_SYMBOL),
                ..Default::default()
            }),
        ])),
        (false, false) => Ok(None),
    }
}
