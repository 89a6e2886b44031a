use thiserror::Error;

use super::types::DataType;

/// Failures while assigning a storage type to a value or expression.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    #[error("list literal contains mixed types: {0} and {1}")]
    MixedListTypes(DataType, DataType),

    #[error("comparison contains mixed types: {0} and {1}")]
    MixedComparisonTypes(DataType, DataType),

    #[error("data type {0} is not an array type")]
    NotAnArrayType(DataType),

    #[error("data type {0} has no array form")]
    NoArrayForm(DataType),

    #[error("unable to infer a storage type for {0}")]
    Uninferrable(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FormatError {
    #[error("unsupported kind matcher type {0} (expected a node or edge composite)")]
    UnsupportedKindMatcherType(DataType),

    #[error("unsupported expression for formatting: {0}")]
    UnsupportedExpression(String),

    #[error("unsupported entity type {0}")]
    UnsupportedEntityType(DataType),

    #[error("unable to encode value as JSON: {0}")]
    Json(String),

    #[error("statement has no body to format")]
    EmptyStatement,

    #[error("formatter write failed")]
    Write(#[from] std::fmt::Error),
}

/// Failures raised by the incremental expression builder.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BuildError {
    #[error("expression builder stack is empty")]
    EmptyStack,

    #[error("expected a binary expression on top of the builder stack but found {0}")]
    NotABinaryExpression(String),

    #[error("binary expression is missing its {0}")]
    IncompleteBinaryExpression(&'static str),

    #[error("binary expression has no open operand slot for the ascending expression")]
    NoOpenOperand,
}
