use thiserror::Error;

use crate::pgsql::errors::TypeError;
use crate::walk::WalkError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnnotationError {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("no value bound for parameter {0}")]
    MissingParameterValue(String),

    #[error("unable to look up type annotation for variable reference: {0}")]
    UnboundDeleteTarget(String),

    #[error("unexpected kind matcher reference type {0}")]
    UnexpectedKindMatcherReference(&'static str),

    #[error("unable to locate a binding type for variable {0}")]
    UnboundKindMatcher(String),

    #[error("variable {0} for projection item is not bound")]
    UnboundProjection(String),

    #[error("expected a single-depth property lookup")]
    MultiDepthPropertyLookup,

    #[error("unable to translate property matcher parameter for binding {0}")]
    PropertyMatcherParameter(String),

    #[error("unable to infer a type for the property matcher value of {0}")]
    UntypedPropertyMatcher(String),

    #[error("string operator \"{0}\" expects a string literal or parameter as its right operand")]
    StringOperand(&'static str),

    #[error("unable to encode parameter {0} as JSONB: {1}")]
    Json(String, String),
}
