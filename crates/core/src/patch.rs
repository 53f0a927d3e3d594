#![forbid(unsafe_code)]

//! Partial updates for collection items.
//!
//! A patch field that is `None` leaves the record untouched. Nullable record fields use
//! `Option<Option<T>>` so an explicit JSON `null` clears them. Required record fields reject
//! an explicit `null` at decode time.

use crate::collection::CollectionItem;
use crate::error::MissionError;
use crate::model::{GoalStatus, StepStatus, TaskStatus, TrajectoryStatus};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

pub trait Patch: Default + std::fmt::Debug {
    fn is_empty(&self) -> bool;
}

/// Shallow merge of `patch` into `record`. Returns `false` when the patch carried no fields.
pub fn apply_partial<T: CollectionItem>(record: &mut T, patch: T::Patch) -> bool {
    if patch.is_empty() {
        return false;
    }
    record.merge(patch);
    true
}

/// Decodes a patch from loosely typed JSON (the shape UI layers send).
pub fn decode_patch<P>(value: serde_json::Value) -> Result<P, MissionError>
where
    P: Patch + DeserializeOwned,
{
    serde_json::from_value(value).map_err(|err| MissionError::InvalidInput(err.to_string()))
}

fn required<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<T>::deserialize(deserializer)? {
        Some(value) => Ok(Some(value)),
        None => Err(serde::de::Error::custom("field must not be null")),
    }
}

fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RoadmapStepPatch {
    #[serde(default, deserialize_with = "required")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "required")]
    pub status: Option<StepStatus>,
}

impl Patch for RoadmapStepPatch {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetupTaskPatch {
    #[serde(default, deserialize_with = "required")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "required")]
    pub status: Option<TaskStatus>,
}

impl Patch for SetupTaskPatch {
    fn is_empty(&self) -> bool {
        self.title.is_none() && self.category.is_none() && self.status.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TrajectoryPatch {
    #[serde(default, deserialize_with = "required")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "required")]
    pub trigger: Option<String>,
    #[serde(default, deserialize_with = "required")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "required")]
    pub status: Option<TrajectoryStatus>,
}

impl Patch for TrajectoryPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.trigger.is_none()
            && self.action.is_none()
            && self.status.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OptimizationGoalPatch {
    #[serde(default, deserialize_with = "required")]
    pub metric: Option<String>,
    #[serde(default, deserialize_with = "required")]
    pub target: Option<f64>,
    #[serde(default, deserialize_with = "required")]
    pub current: Option<f64>,
    #[serde(default, deserialize_with = "required")]
    pub status: Option<GoalStatus>,
}

impl Patch for OptimizationGoalPatch {
    fn is_empty(&self) -> bool {
        self.metric.is_none()
            && self.target.is_none()
            && self.current.is_none()
            && self.status.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ItemId;
    use crate::model::RoadmapStep;
    use serde_json::json;

    fn step() -> RoadmapStep {
        RoadmapStep {
            id: ItemId::from(1),
            title: "Validate".to_string(),
            description: Some("talk to customers".to_string()),
            status: StepStatus::Active,
        }
    }

    #[test]
    fn missing_keys_leave_fields_untouched() {
        let patch: RoadmapStepPatch = decode_patch(json!({ "status": "complete" })).unwrap();
        let mut record = step();
        assert!(apply_partial(&mut record, patch));
        assert_eq!(record.status, StepStatus::Complete);
        assert_eq!(record.title, "Validate");
        assert_eq!(record.description.as_deref(), Some("talk to customers"));
    }

    #[test]
    fn explicit_null_clears_nullable_field() {
        let patch: RoadmapStepPatch = decode_patch(json!({ "description": null })).unwrap();
        assert_eq!(patch.description, Some(None));
        let mut record = step();
        apply_partial(&mut record, patch);
        assert_eq!(record.description, None);
        assert_eq!(record.status, StepStatus::Active);
    }

    #[test]
    fn explicit_null_on_required_field_is_rejected() {
        let err = decode_patch::<RoadmapStepPatch>(json!({ "title": null })).unwrap_err();
        assert!(matches!(err, MissionError::InvalidInput(_)));
    }

    #[test]
    fn ids_and_unknown_keys_are_rejected() {
        assert!(decode_patch::<SetupTaskPatch>(json!({ "id": "9" })).is_err());
        assert!(decode_patch::<SetupTaskPatch>(json!({ "colour": "red" })).is_err());
    }

    #[test]
    fn empty_object_is_an_empty_patch() {
        let patch: TrajectoryPatch = decode_patch(json!({})).unwrap();
        assert!(patch.is_empty());
        let mut record = step();
        assert!(!apply_partial(&mut record, RoadmapStepPatch::default()));
        assert_eq!(record, step());
    }
}
