#![forbid(unsafe_code)]

use super::records::*;
use crate::collection::{Collection, CollectionItem, MissionCollection};
use crate::error::MissionError;
use crate::ids::{ItemId, MissionId};
use serde::{Deserialize, Serialize};

/// Top-level fields of a [`Mission`]. Derived-state rules declare the fields they watch
/// and the fields they write in these terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MissionField {
    Name,
    Stage,
    SignalStrength,
    IgnitionProgress,
    Template,
    SelectedLaunchPad,
    MvpData,
    BusinessStrategy,
    BrandIdentity,
    GrowthMetrics,
    OnboardingCompleted,
    BusinessPlan,
    Roadmap,
    SetupTasks,
    Trajectories,
    OptimizationGoals,
}

impl MissionField {
    pub fn as_str(self) -> &'static str {
        match self {
            MissionField::Name => "name",
            MissionField::Stage => "stage",
            MissionField::SignalStrength => "signalStrength",
            MissionField::IgnitionProgress => "ignitionProgress",
            MissionField::Template => "template",
            MissionField::SelectedLaunchPad => "selectedLaunchPad",
            MissionField::MvpData => "mvpData",
            MissionField::BusinessStrategy => "businessStrategy",
            MissionField::BrandIdentity => "brandIdentity",
            MissionField::GrowthMetrics => "growthMetrics",
            MissionField::OnboardingCompleted => "onboardingCompleted",
            MissionField::BusinessPlan => "businessPlan",
            MissionField::Roadmap => "roadmap",
            MissionField::SetupTasks => "setupTasks",
            MissionField::Trajectories => "trajectories",
            MissionField::OptimizationGoals => "optimizationGoals",
        }
    }
}

/// Replacement of exactly one scalar or value-object field.
#[derive(Clone, Debug, PartialEq)]
pub enum MissionEdit {
    Name(String),
    Stage(Stage),
    SignalStrength(Progress),
    IgnitionProgress(Progress),
    Template(Option<TemplateRef>),
    SelectedLaunchPad(Option<String>),
    MvpData(Option<MvpData>),
    BusinessStrategy(Option<String>),
    BrandIdentity(Option<BrandIdentity>),
    GrowthMetrics(Option<GrowthMetrics>),
    OnboardingCompleted(bool),
    BusinessPlan(String),
}

impl MissionEdit {
    pub fn field(&self) -> MissionField {
        match self {
            MissionEdit::Name(_) => MissionField::Name,
            MissionEdit::Stage(_) => MissionField::Stage,
            MissionEdit::SignalStrength(_) => MissionField::SignalStrength,
            MissionEdit::IgnitionProgress(_) => MissionField::IgnitionProgress,
            MissionEdit::Template(_) => MissionField::Template,
            MissionEdit::SelectedLaunchPad(_) => MissionField::SelectedLaunchPad,
            MissionEdit::MvpData(_) => MissionField::MvpData,
            MissionEdit::BusinessStrategy(_) => MissionField::BusinessStrategy,
            MissionEdit::BrandIdentity(_) => MissionField::BrandIdentity,
            MissionEdit::GrowthMetrics(_) => MissionField::GrowthMetrics,
            MissionEdit::OnboardingCompleted(_) => MissionField::OnboardingCompleted,
            MissionEdit::BusinessPlan(_) => MissionField::BusinessPlan,
        }
    }
}

/// The aggregate root: one venture's full operational state.
///
/// Fields are read through accessors only. Writes go through [`Mission::apply_edit`] and the
/// collection slots, which the session layer wraps with stamping, persistence and
/// recomputation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    id: MissionId,
    created_at: i64,
    last_updated: i64,
    name: String,
    stage: Stage,
    signal_strength: Progress,
    ignition_progress: Progress,
    template: Option<TemplateRef>,
    selected_launch_pad: Option<String>,
    roadmap: Collection<RoadmapStep>,
    setup_tasks: Collection<SetupTask>,
    mvp_data: Option<MvpData>,
    business_strategy: Option<String>,
    brand_identity: Option<BrandIdentity>,
    growth_metrics: Option<GrowthMetrics>,
    trajectories: Collection<Trajectory>,
    optimization_goals: Collection<OptimizationGoal>,
    onboarding_completed: bool,
    business_plan: String,
}

impl Mission {
    pub fn new(id: MissionId, name: &str, now_ms: i64) -> Result<Self, MissionError> {
        Ok(Self {
            id,
            created_at: now_ms,
            last_updated: now_ms,
            name: normalize_name(name)?,
            stage: Stage::Ideation,
            signal_strength: Progress::ZERO,
            ignition_progress: Progress::ZERO,
            template: None,
            selected_launch_pad: None,
            roadmap: default_roadmap(),
            setup_tasks: default_setup_tasks(),
            mvp_data: None,
            business_strategy: None,
            brand_identity: None,
            growth_metrics: None,
            trajectories: Collection::default(),
            optimization_goals: Collection::default(),
            onboarding_completed: false,
            business_plan: String::new(),
        })
    }

    pub fn id(&self) -> &MissionId {
        &self.id
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn last_updated(&self) -> i64 {
        self.last_updated
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn signal_strength(&self) -> Progress {
        self.signal_strength
    }

    pub fn ignition_progress(&self) -> Progress {
        self.ignition_progress
    }

    pub fn template(&self) -> Option<&TemplateRef> {
        self.template.as_ref()
    }

    pub fn selected_launch_pad(&self) -> Option<&str> {
        self.selected_launch_pad.as_deref()
    }

    pub fn roadmap(&self) -> &Collection<RoadmapStep> {
        &self.roadmap
    }

    pub fn setup_tasks(&self) -> &Collection<SetupTask> {
        &self.setup_tasks
    }

    pub fn mvp_data(&self) -> Option<&MvpData> {
        self.mvp_data.as_ref()
    }

    pub fn business_strategy(&self) -> Option<&str> {
        self.business_strategy.as_deref()
    }

    pub fn brand_identity(&self) -> Option<&BrandIdentity> {
        self.brand_identity.as_ref()
    }

    pub fn growth_metrics(&self) -> Option<&GrowthMetrics> {
        self.growth_metrics.as_ref()
    }

    pub fn trajectories(&self) -> &Collection<Trajectory> {
        &self.trajectories
    }

    pub fn optimization_goals(&self) -> &Collection<OptimizationGoal> {
        &self.optimization_goals
    }

    pub fn onboarding_completed(&self) -> bool {
        self.onboarding_completed
    }

    pub fn business_plan(&self) -> &str {
        &self.business_plan
    }

    pub fn collection<T: MissionCollection>(&self) -> &Collection<T> {
        T::slot(self)
    }

    pub fn collection_mut<T: MissionCollection>(&mut self) -> &mut Collection<T> {
        T::slot_mut(self)
    }

    /// Bumps `last_updated`, strictly increasing even when the clock stalls or steps back.
    pub fn stamp(&mut self, now_ms: i64) -> i64 {
        self.last_updated = now_ms.max(self.last_updated.saturating_add(1));
        self.last_updated
    }

    /// Gives the document a new identity (used when importing a snapshot whose id is taken).
    pub fn reassign_id(&mut self, id: MissionId) {
        self.id = id;
    }

    /// Checks what a decoded document does not guarantee on its own: a non-blank name and
    /// unique ids within each collection.
    pub fn validate(&self) -> Result<(), MissionError> {
        normalize_name(&self.name)?;
        ensure_unique(&self.roadmap)?;
        ensure_unique(&self.setup_tasks)?;
        ensure_unique(&self.trajectories)?;
        ensure_unique(&self.optimization_goals)
    }

    pub fn apply_edit(&mut self, edit: MissionEdit) -> Result<MissionField, MissionError> {
        let field = edit.field();
        match edit {
            MissionEdit::Name(name) => self.name = normalize_name(&name)?,
            MissionEdit::Stage(stage) => self.stage = stage,
            MissionEdit::SignalStrength(value) => self.signal_strength = value,
            MissionEdit::IgnitionProgress(value) => self.ignition_progress = value,
            MissionEdit::Template(value) => self.template = value,
            MissionEdit::SelectedLaunchPad(value) => self.selected_launch_pad = value,
            MissionEdit::MvpData(value) => self.mvp_data = value,
            MissionEdit::BusinessStrategy(value) => self.business_strategy = value,
            MissionEdit::BrandIdentity(value) => self.brand_identity = value,
            MissionEdit::GrowthMetrics(value) => self.growth_metrics = value,
            MissionEdit::OnboardingCompleted(value) => self.onboarding_completed = value,
            MissionEdit::BusinessPlan(value) => self.business_plan = value,
        }
        Ok(field)
    }
}

impl MissionCollection for RoadmapStep {
    fn slot(mission: &Mission) -> &Collection<Self> {
        &mission.roadmap
    }

    fn slot_mut(mission: &mut Mission) -> &mut Collection<Self> {
        &mut mission.roadmap
    }
}

impl MissionCollection for SetupTask {
    fn slot(mission: &Mission) -> &Collection<Self> {
        &mission.setup_tasks
    }

    fn slot_mut(mission: &mut Mission) -> &mut Collection<Self> {
        &mut mission.setup_tasks
    }
}

impl MissionCollection for Trajectory {
    fn slot(mission: &Mission) -> &Collection<Self> {
        &mission.trajectories
    }

    fn slot_mut(mission: &mut Mission) -> &mut Collection<Self> {
        &mut mission.trajectories
    }
}

impl MissionCollection for OptimizationGoal {
    fn slot(mission: &Mission) -> &Collection<Self> {
        &mission.optimization_goals
    }

    fn slot_mut(mission: &mut Mission) -> &mut Collection<Self> {
        &mut mission.optimization_goals
    }
}

fn normalize_name(name: &str) -> Result<String, MissionError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(MissionError::InvalidInput(
            "mission name must not be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn ensure_unique<T: CollectionItem>(collection: &Collection<T>) -> Result<(), MissionError> {
    match collection.first_duplicate() {
        Some(id) => Err(MissionError::DuplicateId {
            collection: T::KIND,
            id: id.clone(),
        }),
        None => Ok(()),
    }
}

fn default_roadmap() -> Collection<RoadmapStep> {
    let steps = [
        ("Validate the idea", "Gather signal from real customers", StepStatus::Active),
        ("Set up the business", "Entity, banking and tooling", StepStatus::Locked),
        ("Launch", "Ship the first version", StepStatus::Locked),
        ("Grow", "Automate and optimize", StepStatus::Locked),
    ];
    Collection::new(
        steps
            .into_iter()
            .zip(1u32..)
            .map(|((title, description, status), id)| RoadmapStep {
                id: ItemId::from(id),
                title: title.to_string(),
                description: Some(description.to_string()),
                status,
            })
            .collect(),
    )
}

fn default_setup_tasks() -> Collection<SetupTask> {
    let tasks = [
        ("Register the business", "legal"),
        ("Open a business bank account", "finance"),
        ("Claim a domain name", "brand"),
    ];
    Collection::new(
        tasks
            .into_iter()
            .zip(1u32..)
            .map(|((title, category), id)| SetupTask {
                id: ItemId::from(id),
                title: title.to_string(),
                category: Some(category.to_string()),
                status: TaskStatus::Pending,
            })
            .collect(),
    )
}
