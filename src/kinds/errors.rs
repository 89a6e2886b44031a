use thiserror::Error;

use super::{Kind, KindId};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum KindError {
    #[error("kind {kind} is already mapped to id {existing} and cannot be remapped to {requested}")]
    KindRemapped {
        kind: Kind,
        existing: KindId,
        requested: KindId,
    },

    #[error("kind id {id} is already assigned to kind {existing} and cannot be assigned to {requested}")]
    IdReassigned {
        id: KindId,
        existing: Kind,
        requested: Kind,
    },

    #[error("kind id space exhausted while allocating an id for kind {0}")]
    Exhausted(Kind),
}
