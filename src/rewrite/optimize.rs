//! Post-annotation cleanup of the source tree.

use crate::cypher::{CypherNodeMut, Expression, ExpressionList, KindMatcher};
use crate::walk::{rewrite, split_cypher, RewriteVisitor};

use super::errors::RewriteError;
use super::prune::prune_children;

/// Merge kind matchers of a disjunction that test the same variable.
///
/// Matchers keep the order their variables were first seen in and follow every other member.
/// When nothing but a single merged matcher remains it replaces the disjunction outright.
fn merge_kind_matchers(list: &mut ExpressionList) -> Option<Expression> {
    let mut matchers: Vec<KindMatcher> = Vec::new();
    let mut others = Vec::new();

    for expression in list.expressions.drain(..) {
        match expression {
            Expression::KindMatcher(matcher) => {
                let symbol = matcher.variable().map(|variable| variable.symbol.clone());
                let existing = matchers.iter_mut().find(|candidate| {
                    symbol.is_some()
                        && candidate.variable().map(|variable| &variable.symbol) == symbol.as_ref()
                });

                match existing {
                    Some(existing) => existing.kinds.extend(matcher.kinds),
                    None => matchers.push(matcher),
                }
            }
            other => others.push(other),
        }
    }

    if others.is_empty() && matchers.len() == 1 {
        return matchers.pop().map(Expression::KindMatcher);
    }

    others.extend(matchers.into_iter().map(Expression::KindMatcher));
    list.expressions = others;
    None
}

struct Optimizer;

impl<'a> RewriteVisitor<CypherNodeMut<'a>> for Optimizer {
    type Error = RewriteError;

    fn enter(&mut self, node: &mut CypherNodeMut<'a>) -> Result<(), RewriteError> {
        let CypherNodeMut::Expression(expression) = node else {
            return Ok(());
        };

        let merged = match &mut **expression {
            Expression::Negation(negation) if negation.expression.is_expression_list() => {
                let inner = std::mem::replace(
                    negation.expression.as_mut(),
                    Expression::conjunction(Vec::new()),
                );
                *negation.expression = Expression::parenthetical(inner);
                None
            }
            Expression::Disjunction(list) => merge_kind_matchers(list),
            _ => None,
        };

        if let Some(merged) = merged {
            **expression = merged;
        }

        if let Some(list) = expression.as_expression_list_mut() {
            prune_children(list);
        }

        Ok(())
    }
}

/// Parenthesize negated expression lists, merge kind matchers and prune emptied lists.
pub fn optimize(root: CypherNodeMut<'_>) -> Result<(), RewriteError> {
    rewrite(root, split_cypher, &mut Optimizer)
}
