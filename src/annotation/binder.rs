//! Binding scan
//!
//! The binder walks a query once before anything is annotated. It names every anonymous pattern
//! element, records what each binding refers to, and renames parameters to the positional
//! `p<N>` form used in emitted SQL.
//!
//! Synthetic node bindings are spelled `n<N>` and synthetic edge bindings `e<N>`; both draw from
//! one counter, so `()-[]->()` binds `n0`, `e1` and `n2`. Names already bound by the query are
//! skipped.

use std::collections::{BTreeMap, BTreeSet};

use crate::cypher::{
    CypherNodeMut, Expression, ListLiteral, Parameter, ProjectionItem, Variable,
};
use crate::pgsql::types::{infer_list_type, infer_type, DataType, Value};
use crate::walk::{rewrite, split_cypher, RewriteVisitor};

use super::errors::AnnotationError;

pub const NODE_BINDING_PREFIX: &str = "n";
pub const EDGE_BINDING_PREFIX: &str = "e";
pub const PARAMETER_PREFIX: &str = "p";

#[derive(Debug, Default)]
pub struct Binder {
    bindings: BTreeMap<String, DataType>,
    pattern_bindings: BTreeSet<String>,
    synthetic: BTreeSet<String>,
    aliases: BTreeMap<String, String>,
    supplied: BTreeMap<String, Value>,
    next_binding: usize,
    next_parameter: usize,
    predicate_depth: usize,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A binder that resolves parameters by their source symbol from `parameters`.
    pub fn with_parameters(parameters: BTreeMap<String, Value>) -> Self {
        Binder {
            supplied: parameters,
            ..Default::default()
        }
    }

    pub fn bind(&mut self, symbol: impl Into<String>, data_type: DataType) {
        self.bindings.insert(symbol.into(), data_type);
    }

    /// Bind `symbol` as an element of a matched pattern.
    pub fn bind_pattern(&mut self, symbol: impl Into<String>, data_type: DataType) {
        let symbol = symbol.into();
        self.pattern_bindings.insert(symbol.clone());
        self.bindings.insert(symbol, data_type);
    }

    pub fn is_bound(&self, symbol: &str) -> bool {
        self.bindings.contains_key(symbol)
    }

    pub fn binding_type(&self, symbol: &str) -> Option<DataType> {
        self.bindings.get(symbol).copied()
    }

    pub fn is_pattern_binding(&self, symbol: &str) -> bool {
        self.pattern_bindings.contains(symbol)
    }

    pub fn is_synthetic(&self, symbol: &str) -> bool {
        self.synthetic.contains(symbol)
    }

    /// The symbol a projection alias was bound from.
    pub fn alias_source(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    /// Allocate and bind a fresh synthetic binding.
    pub fn new_binding(&mut self, prefix: &str, data_type: DataType) -> String {
        loop {
            let candidate = format!("{}{}", prefix, self.next_binding);
            self.next_binding += 1;

            if !self.is_bound(&candidate) {
                self.synthetic.insert(candidate.clone());
                self.bind(candidate.clone(), data_type);
                return candidate;
            }
        }
    }

    pub fn new_parameter_symbol(&mut self) -> String {
        let symbol = format!("{}{}", PARAMETER_PREFIX, self.next_parameter);
        self.next_parameter += 1;
        symbol
    }

    fn bind_element(&mut self, binding: &mut Option<Variable>, prefix: &str, data_type: DataType) {
        match binding {
            None => {
                let symbol = self.new_binding(prefix, data_type);
                let mut variable = Variable::new(symbol);
                variable.data_type = Some(data_type);
                *binding = Some(variable);
            }
            Some(variable) => {
                variable.data_type = Some(data_type);

                if self.predicate_depth > 0 {
                    self.bind(variable.symbol.clone(), data_type);
                } else {
                    self.bind_pattern(variable.symbol.clone(), data_type);
                }
            }
        }
    }

    fn bind_parameter(&mut self, parameter: &mut Parameter) -> Result<(), AnnotationError> {
        if let Some(value) = self.supplied.get(&parameter.symbol) {
            parameter.value = Some(value.clone());
        }

        let value = parameter
            .value
            .as_ref()
            .ok_or_else(|| AnnotationError::MissingParameterValue(parameter.symbol.clone()))?;

        parameter.data_type = Some(infer_type(value)?);
        parameter.symbol = self.new_parameter_symbol();
        Ok(())
    }

    fn list_type(&self, list: &ListLiteral) -> Result<DataType, AnnotationError> {
        let element_types = list.items.iter().map(|item| match item {
            Expression::Literal(literal) => infer_type(&literal.value),
            Expression::Parameter(parameter) => {
                match self.supplied.get(&parameter.symbol).or(parameter.value.as_ref()) {
                    Some(value) => infer_type(value),
                    None => Ok(DataType::Unknown),
                }
            }
            _ => Ok(DataType::Unknown),
        });

        Ok(infer_list_type(element_types)?)
    }

    fn bind_projection_alias(&mut self, item: &ProjectionItem) {
        if let (Expression::Variable(variable), Some(alias)) = (&item.expression, &item.binding) {
            let data_type = self
                .binding_type(&variable.symbol)
                .unwrap_or(DataType::Unknown);

            self.bind(alias.symbol.clone(), data_type);
            self.aliases
                .insert(alias.symbol.clone(), variable.symbol.clone());
        }
    }

    /// Run the binding scan over `root`.
    pub fn scan(&mut self, root: CypherNodeMut<'_>) -> Result<(), AnnotationError> {
        rewrite(root, split_cypher, self)
    }
}

impl<'a> RewriteVisitor<CypherNodeMut<'a>> for Binder {
    type Error = AnnotationError;

    fn enter(&mut self, node: &mut CypherNodeMut<'a>) -> Result<(), AnnotationError> {
        match node {
            CypherNodeMut::PatternPart(part) => {
                if let Some(binding) = &mut part.binding {
                    binding.data_type = Some(DataType::Path);
                    self.bind_pattern(binding.symbol.clone(), DataType::Path);
                }
            }
            CypherNodeMut::NodePattern(pattern) => {
                self.bind_element(&mut pattern.binding, NODE_BINDING_PREFIX, DataType::Node)
            }
            CypherNodeMut::RelationshipPattern(pattern) => {
                self.bind_element(&mut pattern.binding, EDGE_BINDING_PREFIX, DataType::Edge)
            }
            CypherNodeMut::ProjectionItem(item) => self.bind_projection_alias(item),
            CypherNodeMut::Expression(expression) => match expression {
                Expression::PatternPredicate(_) => self.predicate_depth += 1,
                Expression::Parameter(parameter) => self.bind_parameter(parameter)?,
                Expression::Literal(literal) => {
                    literal.data_type = Some(infer_type(&literal.value)?)
                }
                Expression::List(list) => list.data_type = Some(self.list_type(list)?),
                _ => {}
            },
            _ => {}
        }

        Ok(())
    }

    fn exit(&mut self, node_type: &'static str) -> Result<(), AnnotationError> {
        if node_type == "PatternPredicate" {
            self.predicate_depth = self.predicate_depth.saturating_sub(1);
        }

        Ok(())
    }
}
