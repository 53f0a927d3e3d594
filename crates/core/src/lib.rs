#![forbid(unsafe_code)]

pub mod collection;
pub mod derive;
mod error;
pub mod ids;
pub mod model;
pub mod patch;

pub use collection::{Collection, CollectionItem, CollectionKind, MissionCollection};
pub use derive::{DerivedRule, RuleSet, ValidationUnlock};
pub use error::MissionError;
pub use ids::{ItemId, MissionId};
pub use model::{Mission, MissionEdit, MissionField, MissionIndexEntry, UserProfile};
