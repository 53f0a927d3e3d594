#![forbid(unsafe_code)]

use crate::collection::{CollectionItem, CollectionKind};
use crate::error::MissionError;
use crate::ids::{ItemId, MissionId};
use crate::patch::{OptimizationGoalPatch, RoadmapStepPatch, SetupTaskPatch, TrajectoryPatch};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Ideation,
    Setup,
    Growth,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Ideation => "ideation",
            Stage::Setup => "setup",
            Stage::Growth => "growth",
        }
    }
}

/// A 0..=100 progress scalar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Progress(u8);

impl Progress {
    pub const ZERO: Progress = Progress(0);
    pub const MAX: Progress = Progress(100);

    pub fn try_new(value: u8) -> Result<Self, MissionError> {
        if value > Self::MAX.0 {
            return Err(MissionError::InvalidInput(format!(
                "progress must be within 0..=100 (got {value})"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn is_max(self) -> bool {
        self == Self::MAX
    }
}

impl TryFrom<u8> for Progress {
    type Error = ProgressOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Progress::try_new(value).map_err(|_| ProgressOutOfRange(value))
    }
}

impl From<Progress> for u8 {
    fn from(value: Progress) -> Self {
        value.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressOutOfRange(pub u8);

impl fmt::Display for ProgressOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "progress must be within 0..=100 (got {})", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Locked,
    Pending,
    Active,
    Complete,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Locked => "locked",
            StepStatus::Pending => "pending",
            StepStatus::Active => "active",
            StepStatus::Complete => "complete",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Complete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrajectoryStatus {
    Draft,
    Active,
    Paused,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    NotStarted,
    OnTrack,
    AtRisk,
    Achieved,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateRef {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MvpData {
    pub summary: String,
    pub features: Vec<String>,
    pub target_audience: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandIdentity {
    pub name: String,
    pub tagline: Option<String>,
    pub voice: Option<String>,
    pub palette: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthMetrics {
    pub revenue: f64,
    pub customers: u64,
    pub conversion_rate: f64,
    pub monthly_growth: f64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapStep {
    pub id: ItemId,
    pub title: String,
    pub description: Option<String>,
    pub status: StepStatus,
}

impl CollectionItem for RoadmapStep {
    type Patch = RoadmapStepPatch;

    const KIND: CollectionKind = CollectionKind::Roadmap;

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn merge(&mut self, patch: RoadmapStepPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupTask {
    pub id: ItemId,
    pub title: String,
    pub category: Option<String>,
    pub status: TaskStatus,
}

impl CollectionItem for SetupTask {
    type Patch = SetupTaskPatch;

    const KIND: CollectionKind = CollectionKind::SetupTasks;

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn merge(&mut self, patch: SetupTaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

/// An automation: when `trigger` fires, run `action`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trajectory {
    pub id: ItemId,
    pub name: String,
    pub trigger: String,
    pub action: String,
    pub status: TrajectoryStatus,
}

impl CollectionItem for Trajectory {
    type Patch = TrajectoryPatch;

    const KIND: CollectionKind = CollectionKind::Trajectories;

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn merge(&mut self, patch: TrajectoryPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(trigger) = patch.trigger {
            self.trigger = trigger;
        }
        if let Some(action) = patch.action {
            self.action = action;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationGoal {
    pub id: ItemId,
    pub metric: String,
    pub target: f64,
    pub current: f64,
    pub status: GoalStatus,
}

impl CollectionItem for OptimizationGoal {
    type Patch = OptimizationGoalPatch;

    const KIND: CollectionKind = CollectionKind::OptimizationGoals;

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn merge(&mut self, patch: OptimizationGoalPatch) {
        if let Some(metric) = patch.metric {
            self.metric = metric;
        }
        if let Some(target) = patch.target {
            self.target = target;
        }
        if let Some(current) = patch.current {
            self.current = current;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissionIndexEntry {
    pub id: MissionId,
    pub name: String,
    pub last_accessed: i64,
}

/// The signed-in actor. Stored apart from every mission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
}
