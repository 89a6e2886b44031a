use thiserror::Error;

use crate::walk::WalkError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RewriteError {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error("multi-part queries not supported")]
    MultiPartQuery,

    #[error("expected one reading clause but saw {0}")]
    ReadingClauseCount(usize),

    #[error("no match or where clause specified")]
    MissingMatchOrWhere,

    #[error("expected where clause to have only one top-level and expression")]
    ExpectedConjunction,

    #[error("expected variable in all shortest paths kind matcher but saw {0}")]
    KindMatcherReference(&'static str),

    #[error("expected only 1 argument")]
    IdentityArguments,

    #[error("unexpected left hand comparison expression: {0}")]
    UnexpectedLeftHand(&'static str),

    #[error("expected start node constraints but found none")]
    MissingRootCriteria,

    #[error("expected end node constraints but found none")]
    MissingTerminalCriteria,

    #[error("no value bound for parameter {0}")]
    MissingParameterValue(String),
}
