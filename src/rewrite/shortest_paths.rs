//! All-shortest-paths predicate decomposition
//!
//! The recursive traversal that answers `allShortestPaths` queries takes three standalone
//! filters instead of one where clause: one for the root node `s`, one for every traversed edge
//! `r` and one for the terminal node `e`. The where clause must be a single conjunction; each
//! filter is that conjunction with every member constraining another binding ripped out.

use log::debug;
use serde::Serialize;

use crate::annotation::Binder;
use crate::config::TranslatorConfig;
use crate::cypher::{CypherNodeMut, Expression, ReadingClause, RegularQuery};
use crate::kinds::KindMapper;
use crate::pgsql::types::DataType;
use crate::pgsql::{SqlWriter, ToSql};
use crate::query::{EDGE_END_SYMBOL, EDGE_START_SYMBOL, EDGE_SYMBOL, IDENTITY_FUNCTION};
use crate::translate::{ExpressionTranslator, TranslationError};
use crate::walk::{rewrite, split_expression, RewriteVisitor};

use super::errors::RewriteError;
use super::parameters::inline_parameters;
use super::prune::prune;

/// Filter fragments for the recursive all-shortest-paths query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllShortestPathsArguments {
    pub root_criteria: String,
    /// `None` when no member of the where clause constrains the edge
    pub traversal_criteria: Option<String>,
    pub terminal_criteria: String,
    pub max_depth: u32,
}

/// Removes list members that constrain a binding other than `target`.
struct Ripper {
    target: &'static str,
    kind_type: DataType,
}

impl Ripper {
    fn new(target: &'static str) -> Self {
        let kind_type = if target == EDGE_SYMBOL {
            DataType::Edge
        } else {
            DataType::Node
        };

        Ripper { target, kind_type }
    }

    /// Whether `member` should stay in the filter for this ripper's target.
    fn keep(&self, member: &mut Expression) -> Result<bool, RewriteError> {
        match member {
            Expression::KindMatcher(matcher) => {
                let Expression::Variable(variable) = matcher.reference.as_ref() else {
                    return Err(RewriteError::KindMatcherReference(matcher.reference.node_type()));
                };

                if variable.symbol != self.target {
                    return Ok(false);
                }

                matcher.data_type = Some(self.kind_type);
                Ok(true)
            }

            Expression::Comparison(comparison) => {
                let subject = match comparison.left.as_ref() {
                    Expression::Variable(_) => comparison.left.as_ref(),
                    Expression::PropertyLookup(lookup) => lookup.atom.as_ref(),
                    Expression::FunctionInvocation(invocation)
                        if invocation.name.eq_ignore_ascii_case(IDENTITY_FUNCTION) =>
                    {
                        match invocation.arguments.as_slice() {
                            [argument] => argument,
                            _ => return Err(RewriteError::IdentityArguments),
                        }
                    }
                    other => return Err(RewriteError::UnexpectedLeftHand(other.node_type())),
                };

                let Expression::Variable(variable) = subject else {
                    return Err(RewriteError::UnexpectedLeftHand(subject.node_type()));
                };

                Ok(variable.symbol == self.target)
            }

            _ => Ok(true),
        }
    }
}

impl<'a> RewriteVisitor<CypherNodeMut<'a>> for Ripper {
    type Error = RewriteError;

    fn enter(&mut self, node: &mut CypherNodeMut<'a>) -> Result<(), RewriteError> {
        let CypherNodeMut::Expression(expression) = node else {
            return Ok(());
        };

        let Some(list) = expression.as_expression_list_mut() else {
            return Ok(());
        };

        let mut index = 0;

        while index < list.len() {
            let Some(member) = list.expressions.get_mut(index) else {
                break;
            };

            if self.keep(member)? {
                index += 1;
            } else {
                list.remove(index);
            }
        }

        Ok(())
    }
}

/// Copy `conjunction` and strip it down to the members constraining `target`.
fn rip(conjunction: &Expression, target: &'static str) -> Result<Expression, RewriteError> {
    let mut ripped = conjunction.clone();
    rewrite(CypherNodeMut::Expression(&mut ripped), split_expression, &mut Ripper::new(target))?;
    prune(&mut ripped);
    Ok(ripped)
}

fn is_empty(expression: &Expression) -> bool {
    expression
        .as_expression_list()
        .map(|list| list.is_empty())
        .unwrap_or(false)
}

/// Type the literals of a ripped filter and render it. Property lookups stay untyped.
fn render(
    mut expression: Expression,
    kind_mapper: &dyn KindMapper,
    config: &TranslatorConfig,
) -> Result<Option<String>, TranslationError> {
    let mut binder = Binder::new();
    binder.scan(CypherNodeMut::Expression(&mut expression))?;

    let mut translator = ExpressionTranslator::new(kind_mapper, &mut binder, config);

    let Some(lowered) = translator.lower_predicate(&expression)? else {
        return Ok(None);
    };

    let mut writer = SqlWriter::new(config.strip_literals);
    lowered.write_sql(&mut writer)?;
    Ok(Some(writer.into_string()))
}

/// Decompose the where clause of an all-shortest-paths query into root, traversal and
/// terminal filters over the bindings `s`, `r` and `e`.
pub fn translate_all_shortest_paths(
    query: &RegularQuery,
    kind_mapper: &dyn KindMapper,
    config: &TranslatorConfig,
) -> Result<AllShortestPathsArguments, TranslationError> {
    let mut query = query.clone();

    let single = query.as_single_part().ok_or(RewriteError::MultiPartQuery)?;
    if single.reading_clauses.len() != 1 {
        return Err(RewriteError::ReadingClauseCount(single.reading_clauses.len()).into());
    }

    // The fragments are standalone text with no parameter binding of their own
    inline_parameters(CypherNodeMut::RegularQuery(&mut query))?;

    let single = query.as_single_part().ok_or(RewriteError::MultiPartQuery)?;
    let where_clause = match single.reading_clauses.first() {
        Some(ReadingClause::Match(match_clause)) => match_clause.where_clause.as_ref(),
        _ => None,
    }
    .ok_or(RewriteError::MissingMatchOrWhere)?;

    let conjunction = match where_clause.expressions.as_slice() {
        [conjunction @ Expression::Conjunction(_)] => conjunction,
        _ => return Err(RewriteError::ExpectedConjunction.into()),
    };

    let root = rip(conjunction, EDGE_START_SYMBOL)?;
    let traversal = rip(conjunction, EDGE_SYMBOL)?;
    let terminal = rip(conjunction, EDGE_END_SYMBOL)?;

    if is_empty(&root) {
        return Err(RewriteError::MissingRootCriteria.into());
    }

    if is_empty(&terminal) {
        return Err(RewriteError::MissingTerminalCriteria.into());
    }

    let root_criteria = render(root, kind_mapper, config)?.ok_or(RewriteError::MissingRootCriteria)?;
    let traversal_criteria = render(traversal, kind_mapper, config)?;
    let terminal_criteria =
        render(terminal, kind_mapper, config)?.ok_or(RewriteError::MissingTerminalCriteria)?;

    debug!(
        "All shortest paths criteria: root [{}] traversal [{}] terminal [{}]",
        root_criteria,
        traversal_criteria.as_deref().unwrap_or(""),
        terminal_criteria
    );

    Ok(AllShortestPathsArguments {
        root_criteria,
        traversal_criteria,
        terminal_criteria,
        max_depth: config.shortest_path_max_depth,
    })
}
