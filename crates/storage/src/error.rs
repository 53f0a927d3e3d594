#![forbid(unsafe_code)]

use mission_core::{CollectionKind, ItemId, MissionError, MissionId};
use std::fmt;

/// The adapter could not complete a read or write. Always surfaced, never swallowed.
#[derive(Debug, thiserror::Error)]
pub enum StorageFailure {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("corrupt value under {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("encode: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Missing {
    Mission(MissionId),
    Item {
        collection: CollectionKind,
        id: ItemId,
    },
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mission(id) => write!(f, "mission {id}"),
            Self::Item { collection, id } => write!(f, "{collection} item {id}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(Missing),
    #[error("duplicate id {id} in {collection}")]
    DuplicateId {
        collection: CollectionKind,
        id: ItemId,
    },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("storage failure: {0}")]
    Storage(#[from] StorageFailure),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    pub(crate) fn mission_not_found(id: &MissionId) -> Self {
        Self::NotFound(Missing::Mission(id.clone()))
    }
}

impl From<MissionError> for StoreError {
    fn from(value: MissionError) -> Self {
        match value {
            MissionError::DuplicateId { collection, id } => Self::DuplicateId { collection, id },
            MissionError::NotFound { collection, id } => {
                Self::NotFound(Missing::Item { collection, id })
            }
            MissionError::InvalidInput(message) => Self::InvalidInput(message),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(StorageFailure::Sql(value))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Storage(StorageFailure::Io(value))
    }
}
