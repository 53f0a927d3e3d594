#![forbid(unsafe_code)]

use crate::collection::CollectionKind;
use crate::ids::ItemId;

/// Failures of the in-memory aggregate. None of these touch storage.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MissionError {
    #[error("duplicate id {id} in {collection}")]
    DuplicateId {
        collection: CollectionKind,
        id: ItemId,
    },
    #[error("{collection} item {id} not found")]
    NotFound {
        collection: CollectionKind,
        id: ItemId,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
