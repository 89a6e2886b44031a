use thiserror::Error;

use crate::walk::WalkError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueryBuilderError {
    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error("criteria reference both the node binding and relationship bindings")]
    MixedBindings,

    #[error("criteria reference no node or relationship binding")]
    NoBindings,

    #[error("only one return clause may be specified")]
    DuplicateReturn,

    #[error("{0} requires a return clause")]
    MissingReturn(&'static str),
}
