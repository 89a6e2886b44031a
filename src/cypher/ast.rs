//! openCypher syntax tree
//!
//! The tree is produced by an external parser or by the builders in [`crate::query`]. Nodes own
//! their children outright so `Clone` is always a deep, structurally independent copy.
//!
//! Expressions that the annotation pass types carry a `data_type` slot that stays `None` until
//! the pass runs.

use std::collections::BTreeMap;
use std::fmt;

use crate::kinds::Kind;
use crate::pgsql::types::{DataType, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct RegularQuery {
    pub single_query: SingleQuery,
}

impl RegularQuery {
    pub fn single_part(query: SinglePartQuery) -> Self {
        RegularQuery {
            single_query: SingleQuery::SinglePart(query),
        }
    }

    pub fn as_single_part(&self) -> Option<&SinglePartQuery> {
        match &self.single_query {
            SingleQuery::SinglePart(query) => Some(query),
            SingleQuery::MultiPart(_) => None,
        }
    }

    pub fn as_single_part_mut(&mut self) -> Option<&mut SinglePartQuery> {
        match &mut self.single_query {
            SingleQuery::SinglePart(query) => Some(query),
            SingleQuery::MultiPart(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SingleQuery {
    SinglePart(SinglePartQuery),
    MultiPart(MultiPartQuery),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SinglePartQuery {
    pub reading_clauses: Vec<ReadingClause>,
    pub updating_clauses: Vec<UpdatingClause>,
    pub return_clause: Option<Return>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiPartQuery {
    pub parts: Vec<MultiPartQueryPart>,
    pub single_part_query: SinglePartQuery,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiPartQueryPart {
    pub reading_clauses: Vec<ReadingClause>,
    pub updating_clauses: Vec<UpdatingClause>,
    pub with: With,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadingClause {
    Match(Match),
    Unwind(Unwind),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Match {
    pub optional: bool,
    pub pattern: Vec<PatternPart>,
    pub where_clause: Option<Where>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Where {
    pub expressions: Vec<Expression>,
}

impl Where {
    pub fn new(expression: Expression) -> Self {
        Where {
            expressions: vec![expression],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Unwind {
    pub expression: Expression,
    pub binding: Variable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdatingClause {
    Create(Create),
    Delete(Delete),
    Set(Set),
    Remove(Remove),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Create {
    pub unique: bool,
    pub pattern: Vec<PatternPart>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Delete {
    pub detach: bool,
    pub expressions: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Set {
    pub items: Vec<SetItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOperator {
    /// `x.p = v`
    Assign,
    /// `x += {map}`
    AddAssign,
    /// `x:Kind`
    LabelAssign,
}

/// A single `set` assignment. Label assignments carry a [`KindMatcher`] on the right.
#[derive(Debug, Clone, PartialEq)]
pub struct SetItem {
    pub left: Expression,
    pub operator: AssignmentOperator,
    pub right: Expression,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Remove {
    pub items: Vec<RemoveItem>,
}

/// A `remove` target: either a kind matcher or a property lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveItem {
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct With {
    pub projection: Projection,
    pub where_clause: Option<Where>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Return {
    pub projection: Projection,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    pub distinct: bool,
    pub all: bool,
    pub items: Vec<ProjectionItem>,
    pub order: Option<Order>,
    pub skip: Option<Skip>,
    pub limit: Option<Limit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionItem {
    pub expression: Expression,
    pub binding: Option<Variable>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Order {
    pub items: Vec<SortItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortItem {
    pub ascending: bool,
    pub expression: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skip {
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Limit {
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatternPart {
    pub binding: Option<Variable>,
    pub shortest_path: bool,
    pub all_shortest_paths: bool,
    pub elements: Vec<PatternElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternElement {
    Node(NodePattern),
    Relationship(RelationshipPattern),
}

impl PatternElement {
    pub fn binding(&self) -> Option<&Variable> {
        match self {
            PatternElement::Node(node) => node.binding.as_ref(),
            PatternElement::Relationship(relationship) => relationship.binding.as_ref(),
        }
    }

    pub fn as_node(&self) -> Option<&NodePattern> {
        match self {
            PatternElement::Node(node) => Some(node),
            PatternElement::Relationship(_) => None,
        }
    }

    pub fn as_relationship(&self) -> Option<&RelationshipPattern> {
        match self {
            PatternElement::Relationship(relationship) => Some(relationship),
            PatternElement::Node(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodePattern {
    pub binding: Option<Variable>,
    pub kinds: Vec<Kind>,
    pub properties: Option<Properties>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Outbound,
    Inbound,
    Both,
}

impl Direction {
    pub fn reverse(self) -> Direction {
        match self {
            Direction::Outbound => Direction::Inbound,
            Direction::Inbound => Direction::Outbound,
            Direction::Both => Direction::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationshipPattern {
    pub binding: Option<Variable>,
    pub kinds: Vec<Kind>,
    pub direction: Direction,
    pub range: Option<PatternRange>,
    pub properties: Option<Properties>,
}

impl Default for RelationshipPattern {
    fn default() -> Self {
        RelationshipPattern {
            binding: None,
            kinds: Vec::new(),
            direction: Direction::Outbound,
            range: None,
            properties: None,
        }
    }
}

/// Variable-length bounds of a relationship pattern, `*start..end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatternRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Properties {
    Map(MapLiteral),
    Parameter(Parameter),
}

/// A pattern used as a boolean expression, `(a)-[]->()`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatternPredicate {
    pub elements: Vec<PatternElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub symbol: String,
    pub data_type: Option<DataType>,
}

impl Variable {
    pub fn new(symbol: impl Into<String>) -> Self {
        Variable {
            symbol: symbol.into(),
            data_type: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub symbol: String,
    pub value: Option<Value>,
    pub data_type: Option<DataType>,
}

impl Parameter {
    pub fn new(symbol: impl Into<String>) -> Self {
        Parameter {
            symbol: symbol.into(),
            value: None,
            data_type: None,
        }
    }

    pub fn with_value(value: impl Into<Value>) -> Self {
        Parameter {
            symbol: String::new(),
            value: Some(value.into()),
            data_type: None,
        }
    }
}

/// A literal value. String values are stored raw; quoting is applied on output.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
    pub data_type: Option<DataType>,
}

impl Literal {
    pub fn new(value: impl Into<Value>) -> Self {
        Literal {
            value: value.into(),
            data_type: None,
        }
    }

    pub fn null() -> Self {
        Literal {
            value: Value::Null,
            data_type: None,
        }
    }

    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListLiteral {
    pub items: Vec<Expression>,
    pub data_type: Option<DataType>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapLiteral {
    pub entries: BTreeMap<String, Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyLookup {
    pub atom: Box<Expression>,
    pub symbols: Vec<String>,
    pub data_type: Option<DataType>,
}

impl PropertyLookup {
    pub fn new(symbol: impl Into<String>, property: impl Into<String>) -> Self {
        PropertyLookup {
            atom: Box::new(Expression::Variable(Variable::new(symbol))),
            symbols: vec![property.into()],
            data_type: None,
        }
    }

    /// The variable the lookup reads from, when the atom is a plain variable.
    pub fn variable(&self) -> Option<&Variable> {
        match self.atom.as_ref() {
            Expression::Variable(variable) => Some(variable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionInvocation {
    pub distinct: bool,
    pub namespace: Vec<String>,
    pub name: String,
    pub arguments: Vec<Expression>,
}

impl FunctionInvocation {
    pub fn new(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        FunctionInvocation {
            distinct: false,
            namespace: Vec::new(),
            name: name.into(),
            arguments,
        }
    }
}

/// `x:Kind1:Kind2`
#[derive(Debug, Clone, PartialEq)]
pub struct KindMatcher {
    pub reference: Box<Expression>,
    pub kinds: Vec<Kind>,
    pub data_type: Option<DataType>,
}

impl KindMatcher {
    pub fn new(reference: Expression, kinds: Vec<Kind>) -> Self {
        KindMatcher {
            reference: Box::new(reference),
            kinds,
            data_type: None,
        }
    }

    pub fn variable(&self) -> Option<&Variable> {
        match self.reference.as_ref() {
            Expression::Variable(variable) => Some(variable),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    In,
    StartsWith,
    EndsWith,
    Contains,
    RegexMatch,
    Is,
    IsNot,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "<>",
            Operator::LessThan => "<",
            Operator::LessThanOrEqualTo => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqualTo => ">=",
            Operator::In => "in",
            Operator::StartsWith => "starts with",
            Operator::EndsWith => "ends with",
            Operator::Contains => "contains",
            Operator::RegexMatch => "=~",
            Operator::Is => "is",
            Operator::IsNot => "is not",
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Power => "^",
        }
    }

    pub fn is_string_operator(&self) -> bool {
        matches!(
            self,
            Operator::StartsWith | Operator::EndsWith | Operator::Contains
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: Box<Expression>,
    pub partials: Vec<PartialComparison>,
}

impl Comparison {
    pub fn new(left: Expression, operator: Operator, right: Expression) -> Self {
        Comparison {
            left: Box::new(left),
            partials: vec![PartialComparison { operator, right }],
        }
    }

    pub fn first_operator(&self) -> Option<Operator> {
        self.partials.first().map(|partial| partial.operator)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartialComparison {
    pub operator: Operator,
    pub right: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArithmeticExpression {
    pub left: Box<Expression>,
    pub partials: Vec<PartialArithmetic>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PartialArithmetic {
    pub operator: Operator,
    pub right: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Negation {
    pub expression: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Parenthetical {
    pub expression: Box<Expression>,
}

/// Operands of a conjunction, disjunction or exclusive disjunction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpressionList {
    pub expressions: Vec<Expression>,
}

impl ExpressionList {
    pub fn new(expressions: Vec<Expression>) -> Self {
        ExpressionList { expressions }
    }

    pub fn add(&mut self, expression: Expression) {
        self.expressions.push(expression);
    }

    pub fn get(&self, index: usize) -> Option<&Expression> {
        self.expressions.get(index)
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    pub fn index_of(&self, expression: &Expression) -> Option<usize> {
        self.expressions.iter().position(|next| next == expression)
    }

    pub fn remove(&mut self, index: usize) -> Option<Expression> {
        if index < self.expressions.len() {
            Some(self.expressions.remove(index))
        } else {
            None
        }
    }

    /// Replace the expression at `index`, returning the one it displaced.
    pub fn replace(&mut self, index: usize, expression: Expression) -> Option<Expression> {
        self.expressions
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, expression))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Variable(Variable),
    Parameter(Parameter),
    Literal(Literal),
    List(ListLiteral),
    Map(MapLiteral),
    PropertyLookup(PropertyLookup),
    FunctionInvocation(FunctionInvocation),
    KindMatcher(KindMatcher),
    Comparison(Comparison),
    Arithmetic(ArithmeticExpression),
    Negation(Negation),
    Parenthetical(Parenthetical),
    Conjunction(ExpressionList),
    Disjunction(ExpressionList),
    ExclusiveDisjunction(ExpressionList),
    PatternPredicate(PatternPredicate),
}

impl Expression {
    pub fn node_type(&self) -> &'static str {
        match self {
            Expression::Variable(_) => "Variable",
            Expression::Parameter(_) => "Parameter",
            Expression::Literal(_) => "Literal",
            Expression::List(_) => "ListLiteral",
            Expression::Map(_) => "MapLiteral",
            Expression::PropertyLookup(_) => "PropertyLookup",
            Expression::FunctionInvocation(_) => "FunctionInvocation",
            Expression::KindMatcher(_) => "KindMatcher",
            Expression::Comparison(_) => "Comparison",
            Expression::Arithmetic(_) => "ArithmeticExpression",
            Expression::Negation(_) => "Negation",
            Expression::Parenthetical(_) => "Parenthetical",
            Expression::Conjunction(_) => "Conjunction",
            Expression::Disjunction(_) => "Disjunction",
            Expression::ExclusiveDisjunction(_) => "ExclusiveDisjunction",
            Expression::PatternPredicate(_) => "PatternPredicate",
        }
    }

    pub fn variable(symbol: impl Into<String>) -> Self {
        Expression::Variable(Variable::new(symbol))
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(Literal::new(value))
    }

    pub fn negation(expression: Expression) -> Self {
        Expression::Negation(Negation {
            expression: Box::new(expression),
        })
    }

    pub fn parenthetical(expression: Expression) -> Self {
        Expression::Parenthetical(Parenthetical {
            expression: Box::new(expression),
        })
    }

    pub fn conjunction(expressions: Vec<Expression>) -> Self {
        Expression::Conjunction(ExpressionList::new(expressions))
    }

    pub fn disjunction(expressions: Vec<Expression>) -> Self {
        Expression::Disjunction(ExpressionList::new(expressions))
    }

    pub fn as_expression_list(&self) -> Option<&ExpressionList> {
        match self {
            Expression::Conjunction(list)
            | Expression::Disjunction(list)
            | Expression::ExclusiveDisjunction(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_expression_list_mut(&mut self) -> Option<&mut ExpressionList> {
        match self {
            Expression::Conjunction(list)
            | Expression::Disjunction(list)
            | Expression::ExclusiveDisjunction(list) => Some(list),
            _ => None,
        }
    }

    pub fn is_expression_list(&self) -> bool {
        self.as_expression_list().is_some()
    }
}

impl From<Variable> for Expression {
    fn from(variable: Variable) -> Self {
        Expression::Variable(variable)
    }
}

impl From<Parameter> for Expression {
    fn from(parameter: Parameter) -> Self {
        Expression::Parameter(parameter)
    }
}

impl From<Literal> for Expression {
    fn from(literal: Literal) -> Self {
        Expression::Literal(literal)
    }
}

impl From<PropertyLookup> for Expression {
    fn from(lookup: PropertyLookup) -> Self {
        Expression::PropertyLookup(lookup)
    }
}

impl From<FunctionInvocation> for Expression {
    fn from(invocation: FunctionInvocation) -> Self {
        Expression::FunctionInvocation(invocation)
    }
}

impl From<KindMatcher> for Expression {
    fn from(matcher: KindMatcher) -> Self {
        Expression::KindMatcher(matcher)
    }
}

impl From<Comparison> for Expression {
    fn from(comparison: Comparison) -> Self {
        Expression::Comparison(comparison)
    }
}

impl From<PatternPredicate> for Expression {
    fn from(predicate: PatternPredicate) -> Self {
        Expression::PatternPredicate(predicate)
    }
}
