use crate::cypher::{CypherNodeMut, Expression, Literal};
use crate::walk::{rewrite, split_cypher, RewriteVisitor};

use super::errors::RewriteError;

struct ParameterInliner;

impl<'a> RewriteVisitor<CypherNodeMut<'a>> for ParameterInliner {
    type Error = RewriteError;

    fn enter(&mut self, node: &mut CypherNodeMut<'a>) -> Result<(), RewriteError> {
        if let CypherNodeMut::Expression(expression) = node {
            if let Expression::Parameter(parameter) = &**expression {
                let value = parameter
                    .value
                    .clone()
                    .ok_or_else(|| RewriteError::MissingParameterValue(parameter.symbol.clone()))?;

                **expression = Expression::Literal(Literal::new(value));
            }
        }

        Ok(())
    }
}

/// Replace every parameter under `root` with a literal of its bound value.
///
/// Strings stay raw; quoting is applied when the literal is formatted.
pub fn inline_parameters(root: CypherNodeMut<'_>) -> Result<(), RewriteError> {
    rewrite(root, split_cypher, &mut ParameterInliner)
}
