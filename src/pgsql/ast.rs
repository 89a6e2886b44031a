//! PostgreSQL syntax tree
//!
//! A deliberately small subset of PostgreSQL: the statements the translator emits plus the
//! graph-aware annotated expressions (entity composites, kind matchers, JSONB property lookups)
//! that the formatter knows how to lower onto the `node` and `edge` tables.

use crate::kinds::KindId;

use super::types::{DataType, Value};

/// A possibly-quoted SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Identifier(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Identifier(name)
    }
}

/// Dotted identifier, `schema.table` or `binding.column`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompoundIdentifier(pub Vec<Identifier>);

impl CompoundIdentifier {
    pub fn new<I, T>(parts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Identifier>,
    {
        CompoundIdentifier(parts.into_iter().map(Into::into).collect())
    }

    /// `binding.column`
    pub fn column(binding: &Identifier, column: &str) -> Self {
        CompoundIdentifier(vec![binding.clone(), Identifier::new(column)])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Query(Query),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    Merge(Merge),
}

impl Statement {
    pub fn node_type(&self) -> &'static str {
        match self {
            Statement::Query(_) => "Query",
            Statement::Insert(_) => "Insert",
            Statement::Update(_) => "Update",
            Statement::Delete(_) => "Delete",
            Statement::Merge(_) => "Merge",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub with: Option<With>,
    pub body: SetExpression,
    pub order_by: Vec<OrderBy>,
    pub offset: Option<Expression>,
    pub limit: Option<Expression>,
}

impl Query {
    pub fn select(select: Select) -> Self {
        Query {
            with: None,
            body: SetExpression::Select(Box::new(select)),
            order_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }

    pub fn values(rows: Vec<Vec<Expression>>) -> Self {
        Query {
            with: None,
            body: SetExpression::Values(Values { rows }),
            order_by: Vec::new(),
            offset: None,
            limit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

impl SetOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetOperator::Union => "union",
            SetOperator::Intersect => "intersect",
            SetOperator::Except => "except",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SetExpression {
    Select(Box<Select>),
    SetOperation(SetOperation),
    Values(Values),
    Query(Box<Query>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetOperation {
    pub operator: SetOperator,
    pub all: bool,
    pub lhs: Box<SetExpression>,
    pub rhs: Box<SetExpression>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Values {
    pub rows: Vec<Vec<Expression>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Select {
    pub distinct: bool,
    pub projection: Vec<Expression>,
    pub from: Vec<FromClause>,
    pub where_clause: Option<Expression>,
    pub group_by: Vec<Expression>,
    pub having: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct With {
    pub recursive: bool,
    pub expressions: Vec<CommonTableExpression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommonTableExpression {
    pub alias: TableAlias,
    pub query: Query,
}

/// CTE name with an optional column shape, `name(a, b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableAlias {
    pub name: Identifier,
    pub shape: Option<Vec<Identifier>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromClause {
    pub source: TableReference,
    pub joins: Vec<Join>,
}

impl FromClause {
    pub fn new(source: TableReference) -> Self {
        FromClause {
            source,
            joins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableReference {
    pub name: CompoundIdentifier,
    pub binding: Option<Identifier>,
}

impl TableReference {
    pub fn new(table: &str, binding: Option<Identifier>) -> Self {
        TableReference {
            name: CompoundIdentifier::new([table]),
            binding,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl JoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "join",
            JoinType::LeftOuter => "left outer join",
            JoinType::RightOuter => "right outer join",
            JoinType::FullOuter => "full outer join",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinOperator {
    pub join_type: JoinType,
    pub constraint: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub table: TableReference,
    pub operator: JoinOperator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub expression: Expression,
    pub ascending: bool,
}

/// `column = value` inside `update ... set` or a merge update action.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: Identifier,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: TableReference,
    pub columns: Vec<Identifier>,
    pub source: Query,
    pub returning: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: TableReference,
    pub assignments: Vec<Assignment>,
    pub from: Vec<FromClause>,
    pub where_clause: Option<Expression>,
    pub returning: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: TableReference,
    pub using: Vec<FromClause>,
    pub where_clause: Option<Expression>,
    pub returning: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    pub target: TableReference,
    pub source: TableReference,
    pub on: Expression,
    pub actions: Vec<MergeAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeAction {
    Matched {
        predicate: Option<Expression>,
        action: MatchedAction,
    },
    NotMatched {
        predicate: Option<Expression>,
        action: NotMatchedAction,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchedAction {
    Update(Vec<Assignment>),
    Delete,
    DoNothing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotMatchedAction {
    Insert {
        columns: Vec<Identifier>,
        values: Vec<Expression>,
    },
    DoNothing,
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
    Like,
    ILike,
    RegexMatch,
    Is,
    IsNot,
    And,
    Or,
    Not,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Concatenate,
    JsonField,
    JsonTextField,
    JsonbFieldExists,
    PgArrayOverlap,
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
            Operator::Like => "like",
            Operator::ILike => "ilike",
            Operator::RegexMatch => "~",
            Operator::Is => "is",
            Operator::IsNot => "is not",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
            Operator::Add => "+",
            Operator::Subtract => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::Power => "^",
            Operator::Concatenate => "||",
            Operator::JsonField => "->",
            Operator::JsonTextField => "->>",
            Operator::JsonbFieldExists => "?",
            Operator::PgArrayOverlap => "operator(pg_catalog.&&)",
        }
    }

    /// JSON navigation operators bind tighter than anything else and are written without spaces.
    pub fn is_json_navigation(&self) -> bool {
        matches!(self, Operator::JsonField | Operator::JsonTextField)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    pub left: Box<Expression>,
    pub operator: Operator,
    pub right: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpression {
    pub operator: Operator,
    pub operand: Box<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    pub distinct: bool,
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(Identifier),
    CompoundIdentifier(CompoundIdentifier),
    Literal(Value),
    AnnotatedLiteral {
        value: Value,
        data_type: DataType,
    },
    /// `@name`
    Parameter(Identifier),
    AnnotatedParameter {
        identifier: Identifier,
        data_type: DataType,
    },
    Wildcard,
    Binary(BinaryExpression),
    Unary(UnaryExpression),
    Parenthetical(Box<Expression>),
    FunctionCall(FunctionCall),
    ArrayLiteral(Vec<Expression>),
    TypeCast {
        expression: Box<Expression>,
        data_type: DataType,
    },
    Any(Box<Expression>),
    CompositeValue {
        values: Vec<Expression>,
        data_type: DataType,
    },
    Exists(Box<Query>),
    Aliased {
        expression: Box<Expression>,
        alias: Identifier,
    },
    /// A whole node or edge row rendered as its composite type.
    Entity {
        binding: Identifier,
        data_type: DataType,
    },
    /// The kind column of a node (`kind_ids`) or edge (`kind_id`).
    KindReference {
        binding: Identifier,
        data_type: DataType,
    },
    PropertyLookup {
        reference: Identifier,
        key: String,
    },
    AnnotatedPropertyLookup {
        reference: Identifier,
        key: String,
        data_type: DataType,
    },
    AnnotatedKindMatcher {
        reference: Identifier,
        kind_ids: Vec<KindId>,
        data_type: DataType,
    },
}

impl Expression {
    pub fn node_type(&self) -> &'static str {
        match self {
            Expression::Identifier(_) => "Identifier",
            Expression::CompoundIdentifier(_) => "CompoundIdentifier",
            Expression::Literal(_) => "Literal",
            Expression::AnnotatedLiteral { .. } => "AnnotatedLiteral",
            Expression::Parameter(_) => "Parameter",
            Expression::AnnotatedParameter { .. } => "AnnotatedParameter",
            Expression::Wildcard => "Wildcard",
            Expression::Binary(_) => "BinaryExpression",
            Expression::Unary(_) => "UnaryExpression",
            Expression::Parenthetical(_) => "Parenthetical",
            Expression::FunctionCall(_) => "FunctionCall",
            Expression::ArrayLiteral(_) => "ArrayLiteral",
            Expression::TypeCast { .. } => "TypeCast",
            Expression::Any(_) => "AnyExpression",
            Expression::CompositeValue { .. } => "CompositeValue",
            Expression::Exists(_) => "ExistsExpression",
            Expression::Aliased { .. } => "AliasedExpression",
            Expression::Entity { .. } => "Entity",
            Expression::KindReference { .. } => "KindReference",
            Expression::PropertyLookup { .. } => "PropertyLookup",
            Expression::AnnotatedPropertyLookup { .. } => "AnnotatedPropertyLookup",
            Expression::AnnotatedKindMatcher { .. } => "AnnotatedKindMatcher",
        }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(Identifier::new(name))
    }

    /// `binding.column`
    pub fn column(binding: &Identifier, column: &str) -> Self {
        Expression::CompoundIdentifier(CompoundIdentifier::column(binding, column))
    }

    pub fn parameter(name: impl Into<String>) -> Self {
        Expression::Parameter(Identifier::new(name))
    }

    pub fn binary(left: Expression, operator: Operator, right: Expression) -> Self {
        Expression::Binary(BinaryExpression {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    pub fn unary(operator: Operator, operand: Expression) -> Self {
        Expression::Unary(UnaryExpression {
            operator,
            operand: Box::new(operand),
        })
    }

    pub fn parenthetical(expression: Expression) -> Self {
        Expression::Parenthetical(Box::new(expression))
    }

    pub fn function(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Expression::FunctionCall(FunctionCall {
            name: name.into(),
            distinct: false,
            arguments,
        })
    }

    pub fn type_cast(expression: Expression, data_type: DataType) -> Self {
        Expression::TypeCast {
            expression: Box::new(expression),
            data_type,
        }
    }

    pub fn aliased(expression: Expression, alias: impl Into<Identifier>) -> Self {
        Expression::Aliased {
            expression: Box::new(expression),
            alias: alias.into(),
        }
    }

    /// Left-fold `expressions` into a chain joined by `operator`. Returns `None` when empty.
    pub fn join_with<I>(operator: Operator, expressions: I) -> Option<Expression>
    where
        I: IntoIterator<Item = Expression>,
    {
        expressions
            .into_iter()
            .reduce(|left, right| Expression::binary(left, operator, right))
    }
}

impl From<Identifier> for Expression {
    fn from(identifier: Identifier) -> Self {
        Expression::Identifier(identifier)
    }
}

impl From<CompoundIdentifier> for Expression {
    fn from(identifier: CompoundIdentifier) -> Self {
        Expression::CompoundIdentifier(identifier)
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Expression::Literal(value)
    }
}

impl From<BinaryExpression> for Expression {
    fn from(expression: BinaryExpression) -> Self {
        Expression::Binary(expression)
    }
}
