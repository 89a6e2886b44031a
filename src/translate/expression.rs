//! Expression lowering
//!
//! [`ExpressionTranslator`] turns annotated Cypher expressions into PostgreSQL expressions.
//! Expressions that were never annotated lower to their plain forms, which is what the
//! shortest-path fragments rely on.

use crate::annotation::{element_criteria, Binder};
use crate::config::TranslatorConfig;
use crate::cypher::{
    self, Comparison, Direction, Expression, ExpressionList, KindMatcher, PartialComparison,
    PatternElement, PatternPredicate, PropertyLookup, Where,
};
use crate::kinds::{kind_names, Kind, KindId, KindMapper};
use crate::pgsql::ast::{
    Expression as PgExpression, FromClause, Identifier, Join, JoinOperator, JoinType, Operator,
    Query, Select, TableReference,
};
use crate::pgsql::types::{
    DataType, Value, COLUMN_END_ID, COLUMN_ID, COLUMN_PROPERTIES, COLUMN_START_ID, EDGE_TABLE,
    NODE_TABLE,
};
use crate::pgsql::Tree;

use super::errors::TranslationError;
use super::functions::lower_function;

fn is_concrete(data_type: Option<DataType>) -> Option<DataType> {
    data_type.filter(|data_type| !matches!(data_type, DataType::Unknown | DataType::Null))
}

fn comparison_operator(operator: cypher::Operator) -> Result<Operator, TranslationError> {
    match operator {
        cypher::Operator::Equals => Ok(Operator::Equals),
        cypher::Operator::NotEquals => Ok(Operator::NotEquals),
        cypher::Operator::LessThan => Ok(Operator::LessThan),
        cypher::Operator::LessThanOrEqualTo => Ok(Operator::LessThanOrEqualTo),
        cypher::Operator::GreaterThan => Ok(Operator::GreaterThan),
        cypher::Operator::GreaterThanOrEqualTo => Ok(Operator::GreaterThanOrEqualTo),
        cypher::Operator::RegexMatch => Ok(Operator::RegexMatch),
        cypher::Operator::StartsWith | cypher::Operator::EndsWith | cypher::Operator::Contains => {
            Ok(Operator::Like)
        }
        cypher::Operator::In => Ok(Operator::In),
        cypher::Operator::Is => Ok(Operator::Is),
        cypher::Operator::IsNot => Ok(Operator::IsNot),
        other => Err(TranslationError::Unsupported(other.as_str())),
    }
}

fn arithmetic_operator(operator: cypher::Operator) -> Result<Operator, TranslationError> {
    match operator {
        cypher::Operator::Add => Ok(Operator::Add),
        cypher::Operator::Subtract => Ok(Operator::Subtract),
        cypher::Operator::Multiply => Ok(Operator::Multiply),
        cypher::Operator::Divide => Ok(Operator::Divide),
        cypher::Operator::Modulo => Ok(Operator::Modulo),
        cypher::Operator::Power => Ok(Operator::Power),
        other => Err(TranslationError::Unsupported(other.as_str())),
    }
}

fn is_null_literal(expression: &Expression) -> bool {
    matches!(expression, Expression::Literal(literal) if literal.is_null())
}

fn is_array_operand(expression: &Expression) -> bool {
    match expression {
        Expression::List(_) => true,
        Expression::Literal(literal) => literal
            .data_type
            .map(|data_type| data_type.is_array_type())
            .unwrap_or(false),
        _ => false,
    }
}

fn same_list_kind(left: &Expression, right: &Expression) -> bool {
    std::mem::discriminant(left) == std::mem::discriminant(right)
}

/// `binding.id`
pub fn identity_column(binding: &Identifier) -> PgExpression {
    PgExpression::column(binding, COLUMN_ID)
}

pub fn element_binding(element: &PatternElement) -> Result<Identifier, TranslationError> {
    element
        .binding()
        .map(|variable| Identifier::new(variable.symbol.as_str()))
        .ok_or(TranslationError::Unsupported("unbound pattern elements"))
}

fn either(left: PgExpression, right: PgExpression) -> PgExpression {
    PgExpression::binary(left, Operator::Or, right)
}

/// Join constraint binding an edge to the node before it in a pattern.
fn edge_join_constraint(edge: &Identifier, node: &Identifier, direction: Direction) -> PgExpression {
    let attached = |column: &str| {
        PgExpression::binary(
            PgExpression::column(edge, column),
            Operator::Equals,
            identity_column(node),
        )
    };

    match direction {
        Direction::Outbound => attached(COLUMN_START_ID),
        Direction::Inbound => attached(COLUMN_END_ID),
        Direction::Both => either(attached(COLUMN_START_ID), attached(COLUMN_END_ID)),
    }
}

/// Join constraint binding a node to the edge before it in a pattern.
fn node_join_constraint(node: &Identifier, edge: &Identifier, direction: Direction) -> PgExpression {
    let attached = |column: &str| {
        PgExpression::binary(
            identity_column(node),
            Operator::Equals,
            PgExpression::column(edge, column),
        )
    };

    match direction {
        Direction::Outbound => attached(COLUMN_END_ID),
        Direction::Inbound => attached(COLUMN_START_ID),
        Direction::Both => either(attached(COLUMN_START_ID), attached(COLUMN_END_ID)),
    }
}

/// Build the `from` clause for one pattern: the first node is the source table and every
/// following element is joined to the one before it.
pub fn pattern_from_clause(elements: &[PatternElement]) -> Result<FromClause, TranslationError> {
    let mut elements = elements.iter();

    let Some(PatternElement::Node(first)) = elements.next() else {
        return Err(TranslationError::Unsupported("patterns that do not start with a node"));
    };

    let mut previous = first
        .binding
        .as_ref()
        .map(|variable| Identifier::new(variable.symbol.as_str()))
        .ok_or(TranslationError::Unsupported("unbound pattern elements"))?;
    let mut previous_direction = None;

    let mut from = FromClause::new(TableReference::new(NODE_TABLE, Some(previous.clone())));

    for element in elements {
        let binding = element_binding(element)?;

        let (table, constraint) = match (element, previous_direction) {
            (PatternElement::Relationship(relationship), None) => {
                if relationship.range.is_some() {
                    return Err(TranslationError::Unsupported(
                        "variable-length relationship patterns",
                    ));
                }

                previous_direction = Some(relationship.direction);
                (
                    EDGE_TABLE,
                    edge_join_constraint(&binding, &previous, relationship.direction),
                )
            }
            (PatternElement::Node(_), Some(direction)) => {
                previous_direction = None;
                (NODE_TABLE, node_join_constraint(&binding, &previous, direction))
            }
            _ => return Err(TranslationError::Unsupported("non-alternating pattern elements")),
        };

        from.joins.push(Join {
            table: TableReference::new(table, Some(binding.clone())),
            operator: JoinOperator {
                join_type: JoinType::Inner,
                constraint,
            },
        });

        previous = binding;
    }

    if previous_direction.is_some() {
        return Err(TranslationError::Unsupported("patterns that end with a relationship"));
    }

    Ok(from)
}

/// Lowers Cypher expressions against one binder and kind mapper.
pub struct ExpressionTranslator<'t> {
    kind_mapper: &'t dyn KindMapper,
    binder: &'t mut Binder,
    assert_kinds: bool,
}

impl<'t> ExpressionTranslator<'t> {
    pub fn new(
        kind_mapper: &'t dyn KindMapper,
        binder: &'t mut Binder,
        config: &TranslatorConfig,
    ) -> Self {
        ExpressionTranslator {
            kind_mapper,
            binder,
            assert_kinds: config.assert_kinds,
        }
    }

    pub fn binder(&self) -> &Binder {
        self.binder
    }

    pub fn binder_mut(&mut self) -> &mut Binder {
        self.binder
    }

    pub fn kind_mapper(&self) -> &dyn KindMapper {
        self.kind_mapper
    }

    pub fn asserts_kinds(&self) -> bool {
        self.assert_kinds
    }

    /// Resolve `kinds` to storage ids, failing on any kind the mapper does not know unless
    /// kind assertion is enabled.
    pub fn kind_ids(&self, kinds: &[Kind]) -> Result<Vec<KindId>, TranslationError> {
        if self.assert_kinds {
            return Ok(self.kind_mapper.assert_kinds(kinds)?);
        }

        let (ids, missing) = self.kind_mapper.map_kinds(kinds);

        if !missing.is_empty() {
            return Err(TranslationError::UndefinedKinds(kind_names(&missing)));
        }

        Ok(ids)
    }

    /// Lower every expression of a where clause into one `and` chain.
    pub fn lower_where(&mut self, where_clause: &Where) -> Result<Option<PgExpression>, TranslationError> {
        let mut lowered = Vec::with_capacity(where_clause.expressions.len());

        for expression in &where_clause.expressions {
            lowered.extend(self.lower_predicate(expression)?);
        }

        Ok(PgExpression::join_with(Operator::And, lowered))
    }

    /// Lower a boolean expression. Empty expression lists lower to nothing.
    pub fn lower_predicate(
        &mut self,
        expression: &Expression,
    ) -> Result<Option<PgExpression>, TranslationError> {
        match expression {
            Expression::Conjunction(list) => self.lower_list(expression, list, Operator::And),
            Expression::Disjunction(list) => self.lower_list(expression, list, Operator::Or),
            Expression::ExclusiveDisjunction(list) => {
                self.lower_list(expression, list, Operator::NotEquals)
            }
            other => self.lower(other).map(Some),
        }
    }

    fn lower_list(
        &mut self,
        owner: &Expression,
        list: &ExpressionList,
        operator: Operator,
    ) -> Result<Option<PgExpression>, TranslationError> {
        let mut tree = Tree::new();
        let depth = tree.len();
        let mut operands = 0;

        tree.push_binary();

        for member in &list.expressions {
            let Some(mut lowered) = self.lower_predicate(member)? else {
                continue;
            };

            let nested_list = member.is_expression_list() && !same_list_kind(owner, member);
            let exclusive = operator == Operator::NotEquals;

            if (nested_list || exclusive) && !matches!(lowered, PgExpression::Parenthetical(_)) {
                lowered = PgExpression::parenthetical(lowered);
            }

            tree.continue_binary_expression(operator, lowered)?;
            operands += 1;
        }

        if operands == 0 {
            return Ok(None);
        }

        Ok(Some(tree.close(depth)?))
    }

    pub fn lower(&mut self, expression: &Expression) -> Result<PgExpression, TranslationError> {
        match expression {
            Expression::Variable(variable) => Ok(PgExpression::identifier(variable.symbol.as_str())),

            Expression::Parameter(parameter) => {
                let identifier = Identifier::new(parameter.symbol.as_str());

                Ok(match is_concrete(parameter.data_type) {
                    Some(data_type) => PgExpression::AnnotatedParameter {
                        identifier,
                        data_type,
                    },
                    None => PgExpression::Parameter(identifier),
                })
            }

            Expression::Literal(literal) => Ok(match is_concrete(literal.data_type) {
                Some(data_type) => PgExpression::AnnotatedLiteral {
                    value: literal.value.clone(),
                    data_type,
                },
                None => PgExpression::Literal(literal.value.clone()),
            }),

            Expression::List(list) => {
                let mut items = Vec::with_capacity(list.items.len());

                for item in &list.items {
                    items.push(self.lower(item)?);
                }

                Ok(PgExpression::ArrayLiteral(items))
            }

            Expression::Map(_) => Err(TranslationError::UnsupportedExpression(expression.node_type())),

            Expression::PropertyLookup(lookup) => self.property_lookup(lookup),

            Expression::FunctionInvocation(invocation) => {
                let mut arguments = Vec::with_capacity(invocation.arguments.len());

                for argument in &invocation.arguments {
                    arguments.push(self.lower(argument)?);
                }

                lower_function(invocation, arguments)
            }

            Expression::KindMatcher(matcher) => self.kind_matcher(matcher),

            Expression::Comparison(comparison) => self.comparison(comparison),

            Expression::Arithmetic(arithmetic) => {
                let mut lowered = self.lower(&arithmetic.left)?;

                for partial in &arithmetic.partials {
                    lowered = PgExpression::binary(
                        lowered,
                        arithmetic_operator(partial.operator)?,
                        self.lower(&partial.right)?,
                    );
                }

                Ok(lowered)
            }

            Expression::Negation(negation) => self.negation(&negation.expression),

            Expression::Parenthetical(parenthetical) => {
                match self.lower_predicate(&parenthetical.expression)? {
                    Some(inner) => Ok(PgExpression::parenthetical(inner)),
                    None => Err(TranslationError::UnsupportedExpression("empty Parenthetical")),
                }
            }

            Expression::Conjunction(_)
            | Expression::Disjunction(_)
            | Expression::ExclusiveDisjunction(_) => self
                .lower_predicate(expression)?
                .ok_or(TranslationError::UnsupportedExpression(expression.node_type())),

            Expression::PatternPredicate(predicate) => self.pattern_predicate(predicate),
        }
    }

    fn property_lookup(&mut self, lookup: &PropertyLookup) -> Result<PgExpression, TranslationError> {
        let Some(variable) = lookup.variable() else {
            return Err(TranslationError::UnsupportedExpression(lookup.atom.node_type()));
        };

        let [key] = lookup.symbols.as_slice() else {
            return Err(TranslationError::Unsupported("multi-segment property lookups"));
        };

        let reference = Identifier::new(variable.symbol.as_str());

        Ok(match is_concrete(lookup.data_type) {
            Some(data_type) => PgExpression::AnnotatedPropertyLookup {
                reference,
                key: key.clone(),
                data_type,
            },
            None => PgExpression::PropertyLookup {
                reference,
                key: key.clone(),
            },
        })
    }

    fn kind_matcher(&mut self, matcher: &KindMatcher) -> Result<PgExpression, TranslationError> {
        let Some(variable) = matcher.variable() else {
            return Err(TranslationError::UnsupportedExpression(matcher.reference.node_type()));
        };

        let data_type = matcher
            .data_type
            .or_else(|| self.binder.binding_type(&variable.symbol))
            .ok_or_else(|| TranslationError::UnboundVariable(variable.symbol.clone()))?;

        Ok(PgExpression::AnnotatedKindMatcher {
            reference: Identifier::new(variable.symbol.as_str()),
            kind_ids: self.kind_ids(&matcher.kinds)?,
            data_type,
        })
    }

    fn negation(&mut self, inner: &Expression) -> Result<PgExpression, TranslationError> {
        // A negated string match must still accept rows where the property is absent
        if let Expression::Comparison(comparison) = inner {
            let string_match = comparison.partials.len() == 1
                && comparison
                    .first_operator()
                    .map(|operator| operator.is_string_operator())
                    .unwrap_or(false);

            if string_match {
                let lowered = self.comparison(comparison)?;
                let subject = self.lower(&comparison.left)?;

                return Ok(PgExpression::parenthetical(PgExpression::binary(
                    PgExpression::unary(Operator::Not, lowered),
                    Operator::Or,
                    PgExpression::binary(subject, Operator::Is, PgExpression::Literal(Value::Null)),
                )));
            }
        }

        let operand = self
            .lower_predicate(inner)?
            .ok_or(TranslationError::UnsupportedExpression("empty Negation"))?;

        Ok(PgExpression::unary(Operator::Not, operand))
    }

    fn comparison(&mut self, comparison: &Comparison) -> Result<PgExpression, TranslationError> {
        let mut lowered = self.lower(&comparison.left)?;

        for (index, partial) in comparison.partials.iter().enumerate() {
            let subject = (index == 0).then_some(comparison.left.as_ref());
            lowered = self.partial_comparison(subject, lowered, partial)?;
        }

        Ok(lowered)
    }

    fn partial_comparison(
        &mut self,
        subject: Option<&Expression>,
        left: PgExpression,
        partial: &PartialComparison,
    ) -> Result<PgExpression, TranslationError> {
        let operator = comparison_operator(partial.operator)?;

        match operator {
            Operator::Is | Operator::IsNot if is_null_literal(&partial.right) => {
                if let Some(Expression::PropertyLookup(lookup)) = subject {
                    if let (Some(variable), [key]) = (lookup.variable(), lookup.symbols.as_slice()) {
                        let exists = PgExpression::binary(
                            PgExpression::column(
                                &Identifier::new(variable.symbol.as_str()),
                                COLUMN_PROPERTIES,
                            ),
                            Operator::JsonbFieldExists,
                            PgExpression::Literal(Value::String(key.clone())),
                        );

                        return Ok(match operator {
                            Operator::Is => PgExpression::unary(Operator::Not, exists),
                            _ => exists,
                        });
                    }
                }

                Ok(PgExpression::binary(
                    left,
                    operator,
                    PgExpression::Literal(Value::Null),
                ))
            }

            Operator::In => {
                let right = self.lower(&partial.right)?;

                Ok(match partial.right {
                    Expression::Parameter(_) => PgExpression::binary(
                        left,
                        Operator::Equals,
                        PgExpression::Any(Box::new(right)),
                    ),
                    _ => PgExpression::binary(left, Operator::In, right),
                })
            }

            _ => {
                let mut right = self.lower(&partial.right)?;

                if operator != Operator::Like
                    && operator != Operator::RegexMatch
                    && is_array_operand(&partial.right)
                {
                    right = PgExpression::function("to_jsonb", vec![right]);
                }

                Ok(PgExpression::binary(left, operator, right))
            }
        }
    }

    /// Lower a pattern predicate to an `exists` subquery over its own copy of the pattern.
    ///
    /// Elements that reuse a variable bound by the enclosing match are rebound to a fresh
    /// synthetic binding and tied back to the outer row by identity.
    fn pattern_predicate(&mut self, predicate: &PatternPredicate) -> Result<PgExpression, TranslationError> {
        let mut elements = predicate.elements.clone();
        let mut criteria = Vec::new();

        for element in &mut elements {
            let (binding, data_type, prefix, kinds, properties) = match element {
                PatternElement::Node(node) => (
                    &mut node.binding,
                    DataType::Node,
                    crate::annotation::binder::NODE_BINDING_PREFIX,
                    std::mem::take(&mut node.kinds),
                    node.properties.take(),
                ),
                PatternElement::Relationship(relationship) => {
                    if relationship.range.is_some() {
                        return Err(TranslationError::Unsupported(
                            "variable-length relationship patterns",
                        ));
                    }

                    (
                        &mut relationship.binding,
                        DataType::Edge,
                        crate::annotation::binder::EDGE_BINDING_PREFIX,
                        std::mem::take(&mut relationship.kinds),
                        relationship.properties.take(),
                    )
                }
            };

            let variable = binding
                .as_mut()
                .ok_or(TranslationError::Unsupported("unbound pattern elements"))?;

            if self.binder.is_pattern_binding(&variable.symbol)
                && !self.binder.is_synthetic(&variable.symbol)
            {
                let rebound = self.binder.new_binding(prefix, data_type);

                criteria.push(PgExpression::binary(
                    identity_column(&Identifier::new(variable.symbol.as_str())),
                    Operator::Equals,
                    identity_column(&Identifier::new(rebound.as_str())),
                ));

                variable.symbol = rebound;
            }

            for criterion in element_criteria(&variable.symbol, data_type, kinds, properties)? {
                criteria.extend(self.lower_predicate(&criterion)?);
            }
        }

        let select = Select {
            projection: vec![PgExpression::Wildcard],
            from: vec![pattern_from_clause(&elements)?],
            where_clause: PgExpression::join_with(Operator::And, criteria),
            ..Default::default()
        };

        let mut query = Query::select(select);
        query.limit = Some(PgExpression::Literal(Value::Int64(1)));

        Ok(PgExpression::Exists(Box::new(query)))
    }
}
