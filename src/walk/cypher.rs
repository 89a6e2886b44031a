//! Cursor constructors for the source syntax tree.

use std::collections::BTreeSet;

use crate::cypher::{CypherNode, CypherNodeMut, Expression};

use super::errors::WalkError;
use super::{walk, Cursor, NodeType, Visitor};

impl NodeType for CypherNodeMut<'_> {
    fn node_type(&self) -> &'static str {
        CypherNodeMut::node_type(self)
    }
}

/// Enumerate every branch of any source node.
pub fn cypher_cursor(node: CypherNode<'_>) -> Result<Cursor<CypherNode<'_>>, WalkError> {
    Ok(Cursor::new(node, node.branches()))
}

fn check_expression_node(node: &CypherNode<'_>) -> Result<(), WalkError> {
    match node {
        CypherNode::Expression(Expression::PatternPredicate(_)) => {
            Err(WalkError::UnsupportedNodeType("PatternPredicate".to_string()))
        }
        CypherNode::Expression(_)
        | CypherNode::PartialComparison(_)
        | CypherNode::PartialArithmetic(_) => Ok(()),
        other => Err(WalkError::UnsupportedNodeType(other.node_type().to_string())),
    }
}

fn check_expression_node_mut(node: &CypherNodeMut<'_>) -> Result<(), WalkError> {
    match node {
        CypherNodeMut::Expression(Expression::PatternPredicate(_)) => {
            Err(WalkError::UnsupportedNodeType("PatternPredicate".to_string()))
        }
        CypherNodeMut::Expression(_)
        | CypherNodeMut::PartialComparison(_)
        | CypherNodeMut::PartialArithmetic(_) => Ok(()),
        other => Err(WalkError::UnsupportedNodeType(other.node_type().to_string())),
    }
}

/// Enumerate branches of expression nodes only.
///
/// Standalone predicates are walked with this constructor: anything clause or pattern shaped,
/// including a pattern predicate, fails the walk.
pub fn expression_cursor(node: CypherNode<'_>) -> Result<Cursor<CypherNode<'_>>, WalkError> {
    check_expression_node(&node)?;
    Ok(Cursor::new(node, node.branches()))
}

/// Split any mutable source node into its children.
pub fn split_cypher(node: CypherNodeMut<'_>) -> Result<Vec<CypherNodeMut<'_>>, WalkError> {
    Ok(node.into_branches())
}

/// Split a mutable expression node into its children, rejecting non-expression nodes.
pub fn split_expression(node: CypherNodeMut<'_>) -> Result<Vec<CypherNodeMut<'_>>, WalkError> {
    check_expression_node_mut(&node)?;
    Ok(node.into_branches())
}

#[derive(Default)]
struct VariableCollector {
    symbols: BTreeSet<String>,
}

impl<'a> Visitor<CypherNode<'a>> for VariableCollector {
    type Error = WalkError;

    fn enter(&mut self, node: CypherNode<'a>) -> Result<(), WalkError> {
        match node {
            CypherNode::Expression(Expression::Variable(variable)) => {
                self.symbols.insert(variable.symbol.clone());
            }
            CypherNode::NodePattern(pattern) => {
                self.symbols.extend(pattern.binding.iter().map(|b| b.symbol.clone()));
            }
            CypherNode::RelationshipPattern(pattern) => {
                self.symbols.extend(pattern.binding.iter().map(|b| b.symbol.clone()));
            }
            _ => {}
        }

        Ok(())
    }
}

/// Collect every variable symbol referenced at or below `root`.
pub fn referenced_variables<'a, F>(root: CypherNode<'a>, cursor: F) -> Result<BTreeSet<String>, WalkError>
where
    F: Fn(CypherNode<'a>) -> Result<Cursor<CypherNode<'a>>, WalkError>,
{
    let mut collector = VariableCollector::default();
    walk(root, cursor, &mut collector)?;
    Ok(collector.symbols)
}
