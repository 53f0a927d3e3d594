#![forbid(unsafe_code)]

use crate::error::MissionError;
use crate::ids::ItemId;
use crate::model::{Mission, MissionField};
use crate::patch::{Patch, apply_partial};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    Roadmap,
    SetupTasks,
    Trajectories,
    OptimizationGoals,
}

impl CollectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionKind::Roadmap => "roadmap",
            CollectionKind::SetupTasks => "setupTasks",
            CollectionKind::Trajectories => "trajectories",
            CollectionKind::OptimizationGoals => "optimizationGoals",
        }
    }

    pub fn field(self) -> MissionField {
        match self {
            CollectionKind::Roadmap => MissionField::Roadmap,
            CollectionKind::SetupTasks => MissionField::SetupTasks,
            CollectionKind::Trajectories => MissionField::Trajectories,
            CollectionKind::OptimizationGoals => MissionField::OptimizationGoals,
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record that lives in one of the mission's homogeneous collections.
pub trait CollectionItem: Clone + fmt::Debug + Serialize + DeserializeOwned {
    type Patch: Patch;

    const KIND: CollectionKind;

    fn id(&self) -> &ItemId;

    /// Writes every field present in `patch` into `self`. Never touches the id.
    fn merge(&mut self, patch: Self::Patch);
}

/// Maps a collection item type to its slot on [`Mission`].
pub trait MissionCollection: CollectionItem {
    fn slot(mission: &Mission) -> &Collection<Self>;

    fn slot_mut(mission: &mut Mission) -> &mut Collection<Self>;
}

/// Ordered list of items with ids unique by construction through [`Collection::add`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T>(Vec<T>);

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: CollectionItem> Collection<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self(items)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.0.iter().position(|item| item.id() == id)
    }

    pub fn get(&self, id: &ItemId) -> Option<&T> {
        self.0.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.position(id).is_some()
    }

    /// The first id that appears more than once, if any.
    pub fn first_duplicate(&self) -> Option<&ItemId> {
        let mut seen = BTreeSet::new();
        self.0.iter().map(|item| item.id()).find(|id| !seen.insert(*id))
    }

    pub fn add(&mut self, item: T) -> Result<(), MissionError> {
        if self.contains(item.id()) {
            return Err(MissionError::DuplicateId {
                collection: T::KIND,
                id: item.id().clone(),
            });
        }
        self.0.push(item);
        Ok(())
    }

    pub fn update(&mut self, id: &ItemId, patch: T::Patch) -> Result<(), MissionError> {
        let Some(item) = self.0.iter_mut().find(|item| item.id() == id) else {
            return Err(not_found::<T>(id));
        };
        apply_partial(item, patch);
        Ok(())
    }

    pub fn remove(&mut self, id: &ItemId) -> Result<T, MissionError> {
        let index = self.position(id).ok_or_else(|| not_found::<T>(id))?;
        Ok(self.0.remove(index))
    }

    /// Bulk replacement. Uniqueness of the incoming ids is the caller's responsibility.
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.0 = items;
    }

    pub(crate) fn get_index_mut(&mut self, index: usize) -> Option<&mut T> {
        self.0.get_mut(index)
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn not_found<T: CollectionItem>(id: &ItemId) -> MissionError {
    MissionError::NotFound {
        collection: T::KIND,
        id: id.clone(),
    }
}
