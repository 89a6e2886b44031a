//! Binding and type annotation
//!
//! Annotation runs in two walks. The [`Binder`] scan names anonymous pattern elements and types
//! literals and parameters from their values. The [`Annotator`] then lifts pattern criteria into
//! the match predicate, types the property lookups each comparison touches, and checks that
//! every reference the emitter will need a type for is bound.

pub mod binder;
pub mod errors;

use std::collections::BTreeMap;

use crate::cypher::{
    Comparison, CypherNode, CypherNodeMut, Expression, FunctionInvocation, KindMatcher, Literal,
    Match, Operator, PatternElement, Properties, PropertyLookup, RegularQuery, Variable, Where,
};
use crate::kinds::Kind;
use crate::pgsql::types::{DataType, Value};
use crate::walk::{cypher_cursor, rewrite, split_cypher, walk, RewriteVisitor, Visitor};

pub use binder::Binder;
pub use errors::AnnotationError;

/// Result type of a temporal function, when `name` is one.
pub fn temporal_function_type(name: &str) -> Option<DataType> {
    match name.to_ascii_lowercase().as_str() {
        "date" => Some(DataType::Date),
        "time" => Some(DataType::TimeWithTimeZone),
        "localtime" => Some(DataType::TimeWithoutTimeZone),
        "datetime" => Some(DataType::TimestampWithTimeZone),
        "localdatetime" => Some(DataType::TimestampWithoutTimeZone),
        "duration" => Some(DataType::Interval),
        _ => None,
    }
}

/// Storage type of a value expression already typed by the binder.
pub fn expression_type(expression: &Expression) -> Option<DataType> {
    match expression {
        Expression::Literal(literal) => literal.data_type,
        Expression::Parameter(parameter) => parameter.data_type,
        Expression::List(list) => list.data_type,
        Expression::PropertyLookup(lookup) => lookup.data_type,
        Expression::Variable(variable) => variable.data_type,
        Expression::FunctionInvocation(invocation) => temporal_function_type(&invocation.name),
        _ => None,
    }
}

/// Turn the kinds and inline properties of a pattern element into predicate criteria.
///
/// Kinds become one kind matcher; each property becomes an equality comparison whose lookup is
/// typed from the matched value.
pub fn element_criteria(
    symbol: &str,
    data_type: DataType,
    kinds: Vec<Kind>,
    properties: Option<Properties>,
) -> Result<Vec<Expression>, AnnotationError> {
    let mut criteria = Vec::new();

    if !kinds.is_empty() {
        let mut reference = Variable::new(symbol);
        reference.data_type = Some(data_type);

        let mut matcher = KindMatcher::new(Expression::Variable(reference), kinds);
        matcher.data_type = Some(data_type);
        criteria.push(Expression::KindMatcher(matcher));
    }

    match properties {
        None => {}
        Some(Properties::Parameter(_)) => {
            return Err(AnnotationError::PropertyMatcherParameter(symbol.to_string()));
        }
        Some(Properties::Map(map)) => {
            for (key, value) in map.entries {
                let mut lookup = PropertyLookup::new(symbol, key.as_str());
                lookup.data_type = Some(
                    expression_type(&value)
                        .ok_or_else(|| AnnotationError::UntypedPropertyMatcher(key.clone()))?,
                );

                criteria.push(Comparison::new(lookup.into(), Operator::Equals, value).into());
            }
        }
    }

    Ok(criteria)
}

fn take_element_criteria(element: &mut PatternElement) -> Result<Vec<Expression>, AnnotationError> {
    let (binding, data_type, kinds, properties) = match element {
        PatternElement::Node(node) => (
            &node.binding,
            DataType::Node,
            std::mem::take(&mut node.kinds),
            node.properties.take(),
        ),
        PatternElement::Relationship(relationship) => (
            &relationship.binding,
            DataType::Edge,
            std::mem::take(&mut relationship.kinds),
            relationship.properties.take(),
        ),
    };

    match binding {
        Some(binding) => element_criteria(&binding.symbol, data_type, kinds, properties),
        None if kinds.is_empty() && properties.is_none() => Ok(Vec::new()),
        None => Err(AnnotationError::UnboundKindMatcher(String::new())),
    }
}

/// Prepend the criteria of every pattern element to the match's where conjunction.
fn lift_match_criteria(match_clause: &mut Match) -> Result<(), AnnotationError> {
    let mut criteria = Vec::new();

    for part in &mut match_clause.pattern {
        for element in &mut part.elements {
            criteria.extend(take_element_criteria(element)?);
        }
    }

    if criteria.is_empty() {
        return Ok(());
    }

    if let Some(existing) = match_clause.where_clause.take() {
        criteria.extend(existing.expressions);
    }

    match_clause.where_clause = Some(Where::new(Expression::conjunction(criteria)));
    Ok(())
}

fn collect_types(expression: &Expression, types: &mut Vec<DataType>) {
    match expression {
        Expression::Parameter(_) | Expression::Literal(_) | Expression::List(_) => {
            types.extend(expression_type(expression));
        }
        Expression::FunctionInvocation(invocation) => {
            match temporal_function_type(&invocation.name) {
                Some(data_type) => types.push(data_type),
                None => {
                    for argument in &invocation.arguments {
                        collect_types(argument, types);
                    }
                }
            }
        }
        Expression::Arithmetic(arithmetic) => {
            collect_types(&arithmetic.left, types);

            for partial in &arithmetic.partials {
                collect_types(&partial.right, types);
            }
        }
        Expression::Parenthetical(parenthetical) => {
            collect_types(&parenthetical.expression, types)
        }
        _ => {}
    }
}

fn comparison_type(left: &Expression, right: &Expression) -> Result<Option<DataType>, AnnotationError> {
    let mut types = Vec::new();
    collect_types(left, &mut types);
    collect_types(right, &mut types);

    let mut resolved: Option<DataType> = None;

    for data_type in types {
        if matches!(data_type, DataType::Null | DataType::Unknown) {
            continue;
        }

        match resolved {
            None => resolved = Some(data_type),
            Some(existing) if existing != data_type => {
                return Err(crate::pgsql::TypeError::MixedComparisonTypes(existing, data_type).into())
            }
            Some(_) => {}
        }
    }

    Ok(resolved)
}

fn apply_wildcards(operator: Operator, value: &str) -> String {
    match operator {
        Operator::StartsWith => format!("{}%", value),
        Operator::EndsWith => format!("%{}", value),
        _ => format!("%{}%", value),
    }
}

fn rewrite_string_operand(operator: Operator, right: &mut Expression) -> Result<(), AnnotationError> {
    let value = match right {
        Expression::Literal(Literal { value, .. }) => value,
        Expression::Parameter(parameter) => match &mut parameter.value {
            Some(value) => value,
            None => return Err(AnnotationError::StringOperand(operator.as_str())),
        },
        _ => return Err(AnnotationError::StringOperand(operator.as_str())),
    };

    match value {
        Value::String(raw) => {
            *raw = apply_wildcards(operator, raw);
            Ok(())
        }
        _ => Err(AnnotationError::StringOperand(operator.as_str())),
    }
}

fn annotate_comparison(comparison: &mut Comparison) -> Result<(), AnnotationError> {
    // Chained comparisons are emitted as written
    let [partial] = comparison.partials.as_mut_slice() else {
        return Ok(());
    };

    if partial.operator.is_string_operator() {
        rewrite_string_operand(partial.operator, &mut partial.right)?;
    }

    let Some(right_type) = comparison_type(&comparison.left, &partial.right)? else {
        return Ok(());
    };

    let left_type = if right_type.is_array_type() {
        if partial.operator == Operator::In {
            right_type.array_base_type()?
        } else {
            DataType::Jsonb
        }
    } else {
        right_type
    };

    if let Expression::PropertyLookup(lookup) = comparison.left.as_mut() {
        lookup.data_type = Some(left_type);
    }

    match &mut partial.right {
        Expression::PropertyLookup(lookup) => lookup.data_type = Some(right_type),
        Expression::Parameter(parameter)
            if right_type.is_array_type() && partial.operator != Operator::In =>
        {
            // Array equality is evaluated against the JSONB form of the property
            if let Some(value) = parameter.value.take() {
                let encoded = serde_json::to_value(&value)
                    .map_err(|e| AnnotationError::Json(parameter.symbol.clone(), e.to_string()))?;
                parameter.value = Some(Value::Jsonb(encoded));
            }
        }
        _ => {}
    }

    Ok(())
}

fn annotate_function(invocation: &mut FunctionInvocation) {
    if invocation.name.eq_ignore_ascii_case("tolower") {
        for argument in &mut invocation.arguments {
            if let Expression::PropertyLookup(lookup) = argument {
                lookup.data_type.get_or_insert(DataType::Text);
            }
        }
    }
}

/// Second annotation walk. See the module documentation.
pub struct Annotator<'b> {
    binder: &'b Binder,
}

impl<'b> Annotator<'b> {
    pub fn new(binder: &'b Binder) -> Self {
        Annotator { binder }
    }

    fn annotate_expression(&self, expression: &mut Expression) -> Result<(), AnnotationError> {
        match expression {
            Expression::Variable(variable) => {
                if let Some(data_type) = self.binder.binding_type(&variable.symbol) {
                    variable.data_type = Some(data_type);
                }
            }
            Expression::KindMatcher(matcher) => {
                let Expression::Variable(reference) = matcher.reference.as_ref() else {
                    return Err(AnnotationError::UnexpectedKindMatcherReference(
                        matcher.reference.node_type(),
                    ));
                };

                let data_type = self
                    .binder
                    .binding_type(&reference.symbol)
                    .ok_or_else(|| AnnotationError::UnboundKindMatcher(reference.symbol.clone()))?;

                matcher.data_type = Some(data_type);
            }
            Expression::PropertyLookup(lookup) => {
                if lookup.symbols.len() != 1 {
                    return Err(AnnotationError::MultiDepthPropertyLookup);
                }
            }
            Expression::Comparison(comparison) => annotate_comparison(comparison)?,
            Expression::FunctionInvocation(invocation) => annotate_function(invocation),
            _ => {}
        }

        Ok(())
    }
}

impl<'a, 'b> RewriteVisitor<CypherNodeMut<'a>> for Annotator<'b> {
    type Error = AnnotationError;

    fn enter(&mut self, node: &mut CypherNodeMut<'a>) -> Result<(), AnnotationError> {
        match node {
            CypherNodeMut::Match(match_clause) => lift_match_criteria(match_clause)?,
            CypherNodeMut::Delete(delete) => {
                for expression in &delete.expressions {
                    if let Expression::Variable(variable) = expression {
                        if !self.binder.is_bound(&variable.symbol) {
                            return Err(AnnotationError::UnboundDeleteTarget(
                                variable.symbol.clone(),
                            ));
                        }
                    }
                }
            }
            CypherNodeMut::ProjectionItem(item) => {
                if let Expression::Variable(variable) = &item.expression {
                    if !self.binder.is_bound(&variable.symbol) {
                        return Err(AnnotationError::UnboundProjection(variable.symbol.clone()));
                    }
                }
            }
            CypherNodeMut::Expression(expression) => self.annotate_expression(expression)?,
            _ => {}
        }

        Ok(())
    }
}

/// A tree an annotation pass can start from.
pub trait AnnotationRoot {
    fn root_node(&mut self) -> CypherNodeMut<'_>;
}

impl AnnotationRoot for RegularQuery {
    fn root_node(&mut self) -> CypherNodeMut<'_> {
        CypherNodeMut::RegularQuery(self)
    }
}

impl AnnotationRoot for Expression {
    fn root_node(&mut self) -> CypherNodeMut<'_> {
        CypherNodeMut::Expression(self)
    }
}

/// Bind then annotate `root`, returning the binder state.
pub fn annotate<R>(root: &mut R, parameters: BTreeMap<String, Value>) -> Result<Binder, AnnotationError>
where
    R: AnnotationRoot + ?Sized,
{
    let mut binder = Binder::with_parameters(parameters);
    binder.scan(root.root_node())?;

    let mut annotator = Annotator::new(&binder);
    rewrite(root.root_node(), split_cypher, &mut annotator)?;

    Ok(binder)
}

#[derive(Default)]
struct ParameterCollector {
    parameters: BTreeMap<String, Value>,
}

impl<'a> Visitor<CypherNode<'a>> for ParameterCollector {
    type Error = AnnotationError;

    fn enter(&mut self, node: CypherNode<'a>) -> Result<(), AnnotationError> {
        if let CypherNode::Expression(Expression::Parameter(parameter)) = node {
            let value = parameter
                .value
                .clone()
                .ok_or_else(|| AnnotationError::MissingParameterValue(parameter.symbol.clone()))?;

            self.parameters.insert(parameter.symbol.clone(), value);
        }

        Ok(())
    }
}

/// Gather every parameter value under `root`, keyed by parameter symbol.
pub fn collect_parameters(root: CypherNode<'_>) -> Result<BTreeMap<String, Value>, AnnotationError> {
    let mut collector = ParameterCollector::default();
    walk(root, cypher_cursor, &mut collector)?;
    Ok(collector.parameters)
}
