//! Generic Walker
//!
//! One iterative traversal shared by both syntax trees. Callers supply a cursor constructor that
//! enumerates the direct children of a node and fails on any node type it does not know, so a
//! forgotten node type surfaces as an error instead of a silently partial walk.
//!
//! # Callbacks
//!
//! - `enter` is called when a node is pushed, before any of its descendants.
//! - `visit` is called between consecutive branches of a node.
//! - `exit` is called when a node is popped, after all of its descendants.
//!
//! # Example
//!
//! ```ignore
//! struct VariableCounter {
//!     count: usize,
//! }
//!
//! impl<'a> Visitor<CypherNode<'a>> for VariableCounter {
//!     type Error = WalkError;
//!
//!     fn enter(&mut self, node: CypherNode<'a>) -> Result<(), WalkError> {
//!         if let CypherNode::Expression(Expression::Variable(_)) = node {
//!             self.count += 1;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! walk(CypherNode::RegularQuery(&query), cypher_cursor, &mut counter)?;
//! ```
//!
//! Two walk shapes are offered. [`walk`] hands out `Copy` node handles and suits analyses.
//! [`rewrite`] hands each node to `enter` by mutable reference before descending into it, which
//! is what in-place rewrites need: whatever `enter` leaves behind is what gets walked.

pub mod cypher;
pub mod errors;
pub mod pgsql;

pub use cypher::{cypher_cursor, expression_cursor, split_cypher, split_expression};
pub use errors::WalkError;
pub use pgsql::{pgsql_cursor, PgNode};

use std::fmt::Display;

/// A node together with its child branches and the index of the next branch to descend into.
#[derive(Debug, Clone)]
pub struct Cursor<N> {
    pub node: N,
    pub branches: Vec<N>,
    pub branch_index: usize,
}

impl<N> Cursor<N> {
    pub fn new(node: N, branches: Vec<N>) -> Self {
        Cursor {
            node,
            branches,
            branch_index: 0,
        }
    }

    pub fn has_next(&self) -> bool {
        self.branch_index < self.branches.len()
    }
}

pub trait Visitor<N> {
    type Error: From<WalkError>;

    fn enter(&mut self, _node: N) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit(&mut self, _node: N) -> Result<(), Self::Error> {
        Ok(())
    }

    fn exit(&mut self, _node: N) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Stop the walk early once this returns true.
    fn done(&self) -> bool {
        false
    }
}

fn stop<V: ?Sized>(visitor: &V, depth: usize, done: fn(&V) -> bool) -> bool {
    if done(visitor) {
        log::trace!("Walk stopped by visitor at depth {}", depth);
        return true;
    }

    false
}

/// Walk the tree rooted at `root` without recursion.
pub fn walk<N, F, V>(root: N, new_cursor: F, visitor: &mut V) -> Result<(), V::Error>
where
    N: Copy,
    F: Fn(N) -> Result<Cursor<N>, WalkError>,
    V: Visitor<N> + ?Sized,
{
    let mut stack = vec![new_cursor(root)?];

    visitor.enter(root)?;

    if stop(visitor, 0, V::done) {
        return Ok(());
    }

    while let Some(top) = stack.last_mut() {
        if top.has_next() {
            let node = top.node;
            let next = top.branches[top.branch_index];
            let is_first = top.branch_index == 0;

            top.branch_index += 1;

            if !is_first {
                visitor.visit(node)?;

                if stop(visitor, stack.len(), V::done) {
                    return Ok(());
                }
            }

            stack.push(new_cursor(next)?);
            visitor.enter(next)?;
        } else {
            let node = top.node;
            stack.pop();
            visitor.exit(node)?;
        }

        if stop(visitor, stack.len(), V::done) {
            return Ok(());
        }
    }

    Ok(())
}

struct Member<'v, N, E> {
    visitor: Box<dyn Visitor<N, Error = E> + 'v>,
    finished: bool,
}

/// Runs several visitors over a single walk.
///
/// Each callback is dispatched, in insertion order, to every member that has not finished. A
/// member finishes when its own `done` turns true or when it fails. The first failure aborts the
/// walk; failures raised by other members during the same dispatch are logged and dropped.
/// The group reports done once any member has failed.
pub struct VisitorGroup<'v, N, E> {
    members: Vec<Member<'v, N, E>>,
    errored: bool,
}

impl<'v, N, E> Default for VisitorGroup<'v, N, E> {
    fn default() -> Self {
        VisitorGroup {
            members: Vec::new(),
            errored: false,
        }
    }
}

impl<'v, N, E> VisitorGroup<'v, N, E>
where
    N: Copy,
    E: From<WalkError> + Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, visitor: impl Visitor<N, Error = E> + 'v) -> &mut Self {
        self.members.push(Member {
            visitor: Box::new(visitor),
            finished: false,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn dispatch<F>(&mut self, mut callback: F) -> Result<(), E>
    where
        F: FnMut(&mut dyn Visitor<N, Error = E>) -> Result<(), E>,
    {
        let mut errors = Vec::new();

        for member in self.members.iter_mut().filter(|member| !member.finished) {
            match callback(member.visitor.as_mut()) {
                Ok(()) => member.finished = member.visitor.done(),
                Err(err) => {
                    member.finished = true;
                    errors.push(err);
                }
            }
        }

        let mut errors = errors.into_iter();

        match errors.next() {
            None => Ok(()),
            Some(first) => {
                self.errored = true;

                for suppressed in errors {
                    log::warn!("Visitor group suppressed an additional error: {}", suppressed);
                }

                Err(first)
            }
        }
    }
}

impl<'v, N, E> Visitor<N> for VisitorGroup<'v, N, E>
where
    N: Copy,
    E: From<WalkError> + Display,
{
    type Error = E;

    fn enter(&mut self, node: N) -> Result<(), E> {
        self.dispatch(|visitor| visitor.enter(node))
    }

    fn visit(&mut self, node: N) -> Result<(), E> {
        self.dispatch(|visitor| visitor.visit(node))
    }

    fn exit(&mut self, node: N) -> Result<(), E> {
        self.dispatch(|visitor| visitor.exit(node))
    }

    fn done(&self) -> bool {
        self.errored || self.members.iter().all(|member| member.finished)
    }
}

/// Anything that can report its node type tag.
pub trait NodeType {
    fn node_type(&self) -> &'static str;
}

/// Visitor for [`rewrite`] walks.
///
/// `enter` receives the node itself and may replace or restructure it; the walk then descends
/// into whatever the node holds after `enter` returns. Once a node has been split into its
/// children it is no longer reachable, so `visit` and `exit` only receive its node type.
pub trait RewriteVisitor<N> {
    type Error: From<WalkError>;

    fn enter(&mut self, _node: &mut N) -> Result<(), Self::Error> {
        Ok(())
    }

    fn visit(&mut self, _node_type: &'static str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn exit(&mut self, _node_type: &'static str) -> Result<(), Self::Error> {
        Ok(())
    }

    fn done(&self) -> bool {
        false
    }
}

struct RewriteFrame<N> {
    node_type: &'static str,
    branches: std::vec::IntoIter<N>,
    branch_index: usize,
}

/// Pre-order mutable walk. `split` consumes a node handle into handles over its children.
pub fn rewrite<N, F, V>(root: N, split: F, visitor: &mut V) -> Result<(), V::Error>
where
    N: NodeType,
    F: Fn(N) -> Result<Vec<N>, WalkError>,
    V: RewriteVisitor<N> + ?Sized,
{
    let mut root = root;
    visitor.enter(&mut root)?;

    if stop(visitor, 0, V::done) {
        return Ok(());
    }

    let mut stack = vec![RewriteFrame {
        node_type: root.node_type(),
        branches: split(root)?.into_iter(),
        branch_index: 0,
    }];

    while let Some(top) = stack.last_mut() {
        match top.branches.next() {
            Some(mut next) => {
                let node_type = top.node_type;
                let is_first = top.branch_index == 0;

                top.branch_index += 1;

                if !is_first {
                    visitor.visit(node_type)?;

                    if stop(visitor, stack.len(), V::done) {
                        return Ok(());
                    }
                }

                visitor.enter(&mut next)?;

                stack.push(RewriteFrame {
                    node_type: next.node_type(),
                    branches: split(next)?.into_iter(),
                    branch_index: 0,
                });
            }
            None => {
                let node_type = top.node_type;
                stack.pop();
                visitor.exit(node_type)?;
            }
        }

        if stop(visitor, stack.len(), V::done) {
            return Ok(());
        }
    }

    Ok(())
}
