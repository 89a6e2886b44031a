//! Incremental expression builder
//!
//! Translation produces target expressions bottom-up while the source tree is walked top-down.
//! [`Tree`] bridges the two: operands are folded onto an explicit stack of partially built
//! binary expressions and attached to their parents as frames complete.

use super::ast::{BinaryExpression, Expression, Operator};
use super::errors::BuildError;

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Partial {
        left: Option<Expression>,
        operator: Option<Operator>,
        right: Option<Expression>,
    },
    Complete(Expression),
}

impl Frame {
    fn empty_binary() -> Self {
        Frame::Partial {
            left: None,
            operator: None,
            right: None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Frame::Partial { .. } => "PartialBinaryExpression".to_string(),
            Frame::Complete(expression) => expression.node_type().to_string(),
        }
    }

    fn build(self) -> Result<Expression, BuildError> {
        match self {
            Frame::Complete(expression) => Ok(expression),
            Frame::Partial {
                left: None, ..
            } => Err(BuildError::IncompleteBinaryExpression("left operand")),
            Frame::Partial {
                left: Some(left),
                operator: None,
                right: None,
            } => Ok(left),
            Frame::Partial {
                left: Some(left),
                operator: Some(operator),
                right: Some(right),
            } => Ok(Expression::Binary(BinaryExpression {
                left: Box::new(left),
                operator,
                right: Box::new(right),
            })),
            Frame::Partial {
                operator: None, ..
            } => Err(BuildError::IncompleteBinaryExpression("operator")),
            Frame::Partial { right: None, .. } => {
                Err(BuildError::IncompleteBinaryExpression("right operand"))
            }
        }
    }
}

/// Stack of in-progress target expressions.
#[derive(Debug, Default)]
pub struct Tree {
    stack: Vec<Frame>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn peek(&self) -> Option<&Frame> {
        self.stack.last()
    }

    pub fn push(&mut self, expression: Expression) {
        self.stack.push(Frame::Complete(expression));
    }

    /// Open an empty binary expression on top of the stack.
    pub fn push_binary(&mut self) {
        self.stack.push(Frame::empty_binary());
    }

    /// Pop and build the top frame.
    pub fn pop(&mut self) -> Result<Expression, BuildError> {
        self.stack.pop().ok_or(BuildError::EmptyStack)?.build()
    }

    /// Fold `operand` into the binary expression on top of the stack.
    ///
    /// The first operand fills the left slot and `operator` is ignored. The second fills the
    /// operator and right slots. Any further operand right-rotates: the current right operand is
    /// lifted out of the top frame and a new frame holding it, `operator` and `operand` is pushed
    /// so later operands attach to the most recent expression.
    pub fn continue_binary_expression(
        &mut self,
        operator: Operator,
        operand: Expression,
    ) -> Result<(), BuildError> {
        let top = self.stack.last_mut().ok_or(BuildError::EmptyStack)?;

        let Frame::Partial {
            left,
            operator: current_operator,
            right,
        } = top
        else {
            return Err(BuildError::NotABinaryExpression(top.describe()));
        };

        if left.is_none() {
            *left = Some(operand);
            return Ok(());
        }

        if right.is_none() {
            *current_operator = Some(operator);
            *right = Some(operand);
            return Ok(());
        }

        let rotated = right.take();
        self.stack.push(Frame::Partial {
            left: rotated,
            operator: Some(operator),
            right: Some(operand),
        });

        Ok(())
    }

    /// Complete the top frame and attach it to the first open operand slot of its parent.
    pub fn ascend(&mut self) -> Result<(), BuildError> {
        let expression = self.pop()?;

        let Some(parent) = self.stack.last_mut() else {
            self.stack.push(Frame::Complete(expression));
            return Ok(());
        };

        match parent {
            Frame::Partial { left: left @ None, .. } => {
                *left = Some(expression);
                Ok(())
            }
            Frame::Partial {
                operator: Some(_),
                right: right @ None,
                ..
            } => {
                *right = Some(expression);
                Ok(())
            }
            _ => {
                self.stack.push(Frame::Complete(expression));
                Err(BuildError::NoOpenOperand)
            }
        }
    }

    /// Ascend every frame above `depth` and pop the frame sitting at `depth`.
    pub fn close(&mut self, depth: usize) -> Result<Expression, BuildError> {
        if self.stack.len() <= depth {
            return Err(BuildError::EmptyStack);
        }

        while self.stack.len() > depth + 1 {
            self.ascend()?;
        }

        self.pop()
    }

    /// Collapse the whole stack into a single expression.
    pub fn finish(&mut self) -> Result<Expression, BuildError> {
        self.close(0)
    }
}
