#![forbid(unsafe_code)]

//! Derived-state rules: one-way recomputation of fields that depend on other fields.
//!
//! Rules are pure functions of the aggregate. They never read the clock and never stamp
//! `last_updated`, so replaying them over a persisted document is deterministic.

use crate::model::{Mission, MissionField, RoadmapStep, StepStatus};
use std::fmt;

pub trait DerivedRule: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Fields whose change makes this rule re-run.
    fn watches(&self) -> &'static [MissionField];

    /// Fields this rule may write. Later rules watching them re-run in the same pass.
    fn writes(&self) -> &'static [MissionField];

    /// Returns `true` when the mission changed.
    fn apply(&self, mission: &mut Mission) -> bool;
}

/// Completes the first roadmap step and unlocks the second once validation signal
/// strength reaches its maximum.
///
/// Only the first two positions are touched; later steps are unlocked by the user. The rule
/// runs only when signal strength is written, never on roadmap edits.
#[derive(Clone, Copy, Debug, Default)]
pub struct ValidationUnlock;

impl DerivedRule for ValidationUnlock {
    fn name(&self) -> &'static str {
        "validation_unlock"
    }

    fn watches(&self) -> &'static [MissionField] {
        &[MissionField::SignalStrength]
    }

    fn writes(&self) -> &'static [MissionField] {
        &[MissionField::Roadmap]
    }

    fn apply(&self, mission: &mut Mission) -> bool {
        if !mission.signal_strength().is_max() {
            return false;
        }
        let roadmap = mission.collection_mut::<RoadmapStep>();
        let mut changed = false;
        if let Some(first) = roadmap.get_index_mut(0)
            && first.status != StepStatus::Complete
        {
            first.status = StepStatus::Complete;
            changed = true;
        }
        if let Some(second) = roadmap.get_index_mut(1)
            && second.status == StepStatus::Locked
        {
            second.status = StepStatus::Active;
            changed = true;
        }
        changed
    }
}

/// Ordered rule list evaluated in a single pass.
#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<Box<dyn DerivedRule>>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::empty().with_rule(ValidationUnlock)
    }
}

impl RuleSet {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, rule: impl DerivedRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Runs every rule watching one of `changed` (or a field written by an earlier rule in
    /// this pass). Returns the names of the rules that changed the mission.
    pub fn recompute(&self, mission: &mut Mission, changed: &[MissionField]) -> Vec<&'static str> {
        let mut dirty: Vec<MissionField> = changed.to_vec();
        let mut fired = Vec::new();
        for rule in &self.rules {
            if !rule.watches().iter().any(|field| dirty.contains(field)) {
                continue;
            }
            if rule.apply(mission) {
                fired.push(rule.name());
                for field in rule.writes() {
                    if !dirty.contains(field) {
                        dirty.push(*field);
                    }
                }
            }
        }
        fired
    }

    /// Runs every rule regardless of what changed. Loading a document does not call this.
    pub fn recompute_all(&self, mission: &mut Mission) -> Vec<&'static str> {
        let mut fired = Vec::new();
        for rule in &self.rules {
            if rule.apply(mission) {
                fired.push(rule.name());
            }
        }
        fired
    }
}
