#![forbid(unsafe_code)]

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::kv::KvStore;
use crate::repository::MissionRepository;
use crate::snapshot::{self, Snapshot};
use mission_core::model::{
    BrandIdentity, GrowthMetrics, MvpData, Progress, Stage, TemplateRef,
};
use mission_core::patch::{Patch, decode_patch};
use mission_core::{
    ItemId, Mission, MissionCollection, MissionEdit, MissionError, MissionField, MissionId,
    MissionIndexEntry, RuleSet, UserProfile,
};
use tracing::{debug, info, warn};

/// Owns the single active mission and is the only write path into it.
///
/// Every mutation is staged on a copy, stamped, recomputed and persisted before it replaces
/// the active mission, so a failed write leaves memory exactly as durable state has it.
#[derive(Debug)]
pub struct SessionManager<K> {
    repo: MissionRepository<K>,
    rules: RuleSet,
    default_name: String,
    active: Mission,
}

impl<K: KvStore> SessionManager<K> {
    /// Cold start: recover the index, then resume the last active mission, else the most
    /// recently accessed one, else a freshly created default.
    pub fn open(repo: MissionRepository<K>, config: &StoreConfig) -> Result<Self, StoreError> {
        Self::open_with_rules(repo, config, RuleSet::default())
    }

    pub fn open_with_rules(
        mut repo: MissionRepository<K>,
        config: &StoreConfig,
        rules: RuleSet,
    ) -> Result<Self, StoreError> {
        let report = repo.recover()?;
        if !report.is_clean() {
            warn!(?report, "mission store needed recovery");
        }

        let resumed = match repo.active_id()? {
            Some(id) => match repo.load(&id) {
                Ok(mission) => Some(mission),
                Err(err) if err.is_not_found() => None,
                Err(err) => return Err(err),
            },
            None => None,
        };
        let resumed = match resumed {
            Some(mission) => Some(mission),
            None => match repo.most_recent(None)? {
                Some(entry) => Some(repo.load(&entry.id)?),
                None => None,
            },
        };

        let active = match resumed {
            Some(mission) => activate(&mut repo, mission)?,
            None => synthesize(&mut repo, &config.default_mission_name)?,
        };
        info!(mission = %active.id(), name = active.name(), "session opened");

        Ok(Self {
            repo,
            rules,
            default_name: config.default_mission_name.clone(),
            active,
        })
    }

    pub fn active(&self) -> &Mission {
        &self.active
    }

    pub fn repository(&self) -> &MissionRepository<K> {
        &self.repo
    }

    pub fn into_repository(self) -> MissionRepository<K> {
        self.repo
    }

    /// Index entries, most recently accessed first.
    pub fn list(&self) -> Result<Vec<MissionIndexEntry>, StoreError> {
        let mut entries = self.repo.list_index()?;
        entries.sort_by(|a, b| b.last_accessed.cmp(&a.last_accessed));
        Ok(entries)
    }

    pub fn create(&mut self, name: &str) -> Result<&Mission, StoreError> {
        let mission = synthesize(&mut self.repo, name)?;
        info!(mission = %mission.id(), name = mission.name(), "mission created");
        self.active = mission;
        Ok(&self.active)
    }

    /// Replaces the active mission wholesale with the stored document for `id`.
    pub fn switch_to(&mut self, id: &MissionId) -> Result<&Mission, StoreError> {
        let mission = self.repo.load(id)?;
        let mission = activate(&mut self.repo, mission)?;
        info!(from = %self.active.id(), to = %mission.id(), "switched mission");
        self.active = mission;
        Ok(&self.active)
    }

    /// Deletes a mission. Deleting the active one first activates a fallback, so the active
    /// pointer never names a deleted document.
    pub fn delete(&mut self, id: &MissionId) -> Result<(), StoreError> {
        if self.active.id() != id {
            self.repo.remove_document(id)?;
            info!(mission = %id, "mission deleted");
            return Ok(());
        }

        let fallback = match self.repo.most_recent(Some(id))? {
            Some(entry) => {
                warn!(deleted = %id, fallback = %entry.id, "active mission deleted; resuming most recent");
                let mission = self.repo.load(&entry.id)?;
                activate(&mut self.repo, mission)?
            }
            None => {
                warn!(deleted = %id, "last mission deleted; creating a default");
                synthesize(&mut self.repo, &self.default_name)?
            }
        };
        self.active = fallback;
        self.repo.remove_document(id)?;
        info!(mission = %id, active = %self.active.id(), "active mission deleted");
        Ok(())
    }

    pub fn export_snapshot(&self) -> Result<Snapshot, StoreError> {
        snapshot::export(&self.active)
    }

    /// Stores an exported snapshot as a mission and activates it. A snapshot whose id is
    /// already taken gets a fresh one instead of overwriting. Snapshots with a blank name or
    /// repeated item ids are rejected as `InvalidInput`.
    pub fn import_snapshot(&mut self, bytes: &[u8]) -> Result<&Mission, StoreError> {
        let mut mission = snapshot::decode(bytes)?;
        if self.repo.exists(mission.id())? {
            let original = mission.id().clone();
            mission.reassign_id(MissionId::generate());
            debug!(%original, assigned = %mission.id(), "imported snapshot id already taken");
        }
        mission.stamp(self.repo.now_ms());
        self.repo.save_active(&mission)?;
        info!(mission = %mission.id(), name = mission.name(), "snapshot imported");
        self.active = mission;
        Ok(&self.active)
    }

    pub fn user_profile(&self) -> Result<Option<UserProfile>, StoreError> {
        self.repo.user_profile()
    }

    pub fn set_user_profile(&mut self, profile: &UserProfile) -> Result<(), StoreError> {
        self.repo.save_user_profile(profile)
    }

    pub fn clear_user_profile(&mut self) -> Result<bool, StoreError> {
        self.repo.clear_user_profile()
    }

    pub fn edit(&mut self, edit: MissionEdit) -> Result<(), StoreError> {
        let field = edit.field();
        self.commit(field, move |mission| mission.apply_edit(edit).map(|_| ()))
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), StoreError> {
        self.edit(MissionEdit::Name(name.to_string()))
    }

    pub fn set_stage(&mut self, stage: Stage) -> Result<(), StoreError> {
        self.edit(MissionEdit::Stage(stage))
    }

    pub fn set_signal_strength(&mut self, value: u8) -> Result<(), StoreError> {
        self.edit(MissionEdit::SignalStrength(Progress::try_new(value)?))
    }

    pub fn set_ignition_progress(&mut self, value: u8) -> Result<(), StoreError> {
        self.edit(MissionEdit::IgnitionProgress(Progress::try_new(value)?))
    }

    pub fn set_template(&mut self, template: Option<TemplateRef>) -> Result<(), StoreError> {
        self.edit(MissionEdit::Template(template))
    }

    pub fn set_selected_launch_pad(&mut self, launch_pad: Option<String>) -> Result<(), StoreError> {
        self.edit(MissionEdit::SelectedLaunchPad(launch_pad))
    }

    pub fn set_mvp_data(&mut self, mvp: Option<MvpData>) -> Result<(), StoreError> {
        self.edit(MissionEdit::MvpData(mvp))
    }

    pub fn set_business_strategy(&mut self, strategy: Option<String>) -> Result<(), StoreError> {
        self.edit(MissionEdit::BusinessStrategy(strategy))
    }

    pub fn set_brand_identity(&mut self, brand: Option<BrandIdentity>) -> Result<(), StoreError> {
        self.edit(MissionEdit::BrandIdentity(brand))
    }

    pub fn set_growth_metrics(&mut self, metrics: Option<GrowthMetrics>) -> Result<(), StoreError> {
        self.edit(MissionEdit::GrowthMetrics(metrics))
    }

    pub fn set_onboarding_completed(&mut self, completed: bool) -> Result<(), StoreError> {
        self.edit(MissionEdit::OnboardingCompleted(completed))
    }

    pub fn set_business_plan(&mut self, plan: &str) -> Result<(), StoreError> {
        self.edit(MissionEdit::BusinessPlan(plan.to_string()))
    }

    pub fn add<T: MissionCollection>(&mut self, item: T) -> Result<(), StoreError> {
        self.commit(T::KIND.field(), move |mission| {
            mission.collection_mut::<T>().add(item)
        })
    }

    /// Shallow-merges `patch` into item `id`. An empty patch only checks that the item
    /// exists; nothing is stamped or written.
    pub fn update<T: MissionCollection>(
        &mut self,
        id: &ItemId,
        patch: T::Patch,
    ) -> Result<(), StoreError> {
        if patch.is_empty() {
            if !self.active.collection::<T>().contains(id) {
                return Err(MissionError::NotFound {
                    collection: T::KIND,
                    id: id.clone(),
                }
                .into());
            }
            return Ok(());
        }
        self.commit(T::KIND.field(), move |mission| {
            mission.collection_mut::<T>().update(id, patch)
        })
    }

    /// Like [`SessionManager::update`], decoding the patch from JSON first.
    pub fn update_json<T: MissionCollection>(
        &mut self,
        id: &ItemId,
        patch: serde_json::Value,
    ) -> Result<(), StoreError>
    where
        T::Patch: serde::de::DeserializeOwned,
    {
        let patch = decode_patch::<T::Patch>(patch)?;
        self.update::<T>(id, patch)
    }

    pub fn remove<T: MissionCollection>(&mut self, id: &ItemId) -> Result<T, StoreError> {
        self.commit(T::KIND.field(), |mission| {
            mission.collection_mut::<T>().remove(id)
        })
    }

    pub fn replace_all<T: MissionCollection>(&mut self, items: Vec<T>) -> Result<(), StoreError> {
        self.commit(T::KIND.field(), move |mission| {
            mission.collection_mut::<T>().replace_all(items);
            Ok(())
        })
    }

    fn commit<F, R>(&mut self, changed: MissionField, mutate: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Mission) -> Result<R, MissionError>,
    {
        let mut next = self.active.clone();
        let output = mutate(&mut next)?;
        let last_updated = next.stamp(self.repo.now_ms());
        let fired = self.rules.recompute(&mut next, &[changed]);
        self.repo.save(&next)?;
        debug!(
            mission = %next.id(),
            field = changed.as_str(),
            last_updated,
            ?fired,
            "mutation committed"
        );
        self.active = next;
        Ok(output)
    }
}

/// Creates, persists and records as last active a mission with default content.
fn synthesize<K: KvStore>(
    repo: &mut MissionRepository<K>,
    name: &str,
) -> Result<Mission, StoreError> {
    let mission = Mission::new(MissionId::generate(), name, repo.now_ms())?;
    repo.save_active(&mission)?;
    Ok(mission)
}

/// Shared by cold start, switching and delete fallback. The stored document is taken as is;
/// derived rules only run when one of their watched fields is written.
fn activate<K: KvStore>(
    repo: &mut MissionRepository<K>,
    mission: Mission,
) -> Result<Mission, StoreError> {
    let entry = repo.activate(mission.id())?;
    debug!(mission = %mission.id(), last_accessed = entry.last_accessed, "mission activated");
    Ok(mission)
}
