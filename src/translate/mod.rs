//! Cypher to PostgreSQL translation
//!
//! [`translate`] runs the full pipeline on a copy of the caller's query: annotation, the
//! post-annotation optimizer, lowering to a PostgreSQL statement and formatting.

pub mod errors;
pub mod expression;
pub mod functions;
pub mod statement;

use std::collections::BTreeMap;

use log::debug;

use crate::annotation::{annotate, collect_parameters};
use crate::config::TranslatorConfig;
use crate::cypher::{CypherNode, CypherNodeMut, RegularQuery};
use crate::kinds::KindMapper;
use crate::pgsql::ast::{Expression as PgExpression, Statement};
use crate::pgsql::{format_statement, Identifier, IdentifierSet, Value};
use crate::rewrite::optimize;
use crate::walk::pgsql::{pgsql_cursor, PgNode};
use crate::walk::{walk, Visitor, WalkError};

pub use errors::TranslationError;
pub use expression::ExpressionTranslator;
pub use statement::StatementTranslator;

/// The result of translating one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub statement: Statement,
    pub sql: String,
    /// Values for every parameter the statement references, keyed by parameter symbol
    pub parameters: BTreeMap<String, Value>,
}

#[derive(Default)]
struct ParameterReferences {
    identifiers: IdentifierSet,
}

impl<'a> Visitor<PgNode<'a>> for ParameterReferences {
    type Error = WalkError;

    fn enter(&mut self, node: PgNode<'a>) -> Result<(), WalkError> {
        if let PgNode::Expression(
            PgExpression::Parameter(identifier) | PgExpression::AnnotatedParameter { identifier, .. },
        ) = node
        {
            self.identifiers.add(identifier.clone());
        }

        Ok(())
    }
}

/// Symbols of every parameter referenced anywhere in `statement`.
pub fn referenced_parameters(statement: &Statement) -> Result<IdentifierSet, WalkError> {
    let mut references = ParameterReferences::default();
    walk(PgNode::Statement(statement), pgsql_cursor, &mut references)?;
    Ok(references.identifiers)
}

/// Translate `query` into a PostgreSQL statement.
///
/// `parameters` supplies values for named parameters in the query. The caller's tree is left
/// untouched.
pub fn translate(
    query: &RegularQuery,
    parameters: &BTreeMap<String, Value>,
    kind_mapper: &dyn KindMapper,
    config: &TranslatorConfig,
) -> Result<Translation, TranslationError> {
    debug!("Translating query with {} supplied parameter(s)", parameters.len());

    let mut query = query.clone();
    let mut binder = annotate(&mut query, parameters.clone())?;
    optimize(CypherNodeMut::RegularQuery(&mut query))?;

    let mut bound = collect_parameters(CypherNode::RegularQuery(&query))?;

    let mut translator =
        StatementTranslator::new(ExpressionTranslator::new(kind_mapper, &mut binder, config));
    let statement = translator.translate(&query)?;
    bound.extend(translator.into_parameters());

    // Values folded into mutation parameters are no longer referenced
    let referenced = referenced_parameters(&statement)?;
    bound.retain(|symbol, _| referenced.contains(&Identifier::new(symbol.as_str())));

    let sql = format_statement(&statement, config.strip_literals)?;

    debug!(
        "Translated {} statement with {} parameter(s): {}",
        statement.node_type(),
        bound.len(),
        sql
    );

    Ok(Translation {
        statement,
        sql,
        parameters: bound,
    })
}
