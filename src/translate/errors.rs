use thiserror::Error;

use crate::annotation::AnnotationError;
use crate::kinds::KindError;
use crate::pgsql::errors::{BuildError, FormatError, TypeError};
use crate::pgsql::types::DataType;
use crate::query::QueryBuilderError;
use crate::rewrite::RewriteError;
use crate::walk::WalkError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TranslationError {
    #[error(transparent)]
    Annotation(#[from] AnnotationError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Kind(#[from] KindError),

    #[error(transparent)]
    Query(#[from] QueryBuilderError),

    #[error("query references the following undefined kinds: [{}]", .0.join(", "))]
    UndefinedKinds(Vec<String>),

    #[error("updating clause references the following unknown kinds: [{}]", .0.join(", "))]
    UnknownUpdateKinds(Vec<String>),

    #[error("unsupported function: {0}")]
    UnsupportedFunction(String),

    #[error("unsupported expression type: {0}")]
    UnsupportedExpression(&'static str),

    #[error("{0} is not supported")]
    Unsupported(&'static str),

    #[error("unable to look up a binding type for variable {0}")]
    UnboundVariable(String),

    #[error("expected {expected} argument(s) for function {function} but saw {actual}")]
    FunctionArguments {
        function: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid pattern direction")]
    InvalidDirection,

    #[error("unsupported SQL type for kind mutation: {0}")]
    KindMutationType(DataType),

    #[error("unsupported update clause item: {0}")]
    UnsupportedUpdateItem(&'static str),

    #[error("updates to multiple bindings are not supported: {0} and {1}")]
    MultipleUpdateTargets(String, String),

    #[error("multiple node delete statements are not supported")]
    MultipleNodeDeletes,

    #[error("multiple edge delete statements are not supported")]
    MultipleEdgeDeletes,

    #[error("mixed deletions are not supported")]
    MixedDeletes,

    #[error("unable to encode parameter {0} as JSONB: {1}")]
    Json(String, String),
}
