use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WalkError {
    #[error("unsupported node type: {0}")]
    UnsupportedNodeType(String),
}
