#![forbid(unsafe_code)]

use crate::clock::{Clock, SystemClock};
use crate::error::{StorageFailure, StoreError};
use crate::kv::{KvOp, KvStore};
use mission_core::{Mission, MissionId, MissionIndexEntry, UserProfile};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use tracing::{debug, warn};

const MISSION_KEY_PREFIX: &str = "mission/";
const INDEX_KEY: &str = "mission-index";
const ACTIVE_KEY: &str = "session/active";
const PROFILE_KEY: &str = "profile/user";

/// What [`MissionRepository::recover`] repaired.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Index entries dropped because their document is gone (or duplicated).
    pub dropped_entries: Vec<MissionId>,
    /// Documents that had no index entry and were re-indexed.
    pub reindexed: Vec<MissionId>,
    /// Keys holding documents that could not be decoded. Left in place.
    pub corrupt_keys: Vec<String>,
    pub cleared_active: bool,
}

impl RecoveryReport {
    pub fn is_clean(&self) -> bool {
        self.dropped_entries.is_empty()
            && self.reindexed.is_empty()
            && self.corrupt_keys.is_empty()
            && !self.cleared_active
    }
}

/// Keyed load/save of full mission documents plus the lightweight mission index.
///
/// A document and its index entry are always written in one batch, so the two never
/// disagree after a completed call.
#[derive(Debug)]
pub struct MissionRepository<K> {
    kv: K,
    clock: Box<dyn Clock>,
}

impl<K: KvStore> MissionRepository<K> {
    pub fn new(kv: K) -> Self {
        Self::with_clock(kv, SystemClock)
    }

    pub fn with_clock(kv: K, clock: impl Clock + 'static) -> Self {
        Self {
            kv,
            clock: Box::new(clock),
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn into_kv(self) -> K {
        self.kv
    }

    pub fn load(&self, id: &MissionId) -> Result<Mission, StoreError> {
        let key = mission_key(id);
        let Some(raw) = self.kv.get(&key)? else {
            return Err(StoreError::mission_not_found(id));
        };
        Ok(decode(&key, &raw)?)
    }

    pub fn exists(&self, id: &MissionId) -> Result<bool, StoreError> {
        Ok(self.kv.get(&mission_key(id))?.is_some())
    }

    /// Writes the full document and upserts its index entry. Safe to repeat.
    pub fn save(&mut self, mission: &Mission) -> Result<MissionIndexEntry, StoreError> {
        self.write_document(mission, false)
    }

    /// Like [`MissionRepository::save`], also recording the mission as last active in the
    /// same batch.
    pub fn save_active(&mut self, mission: &Mission) -> Result<MissionIndexEntry, StoreError> {
        self.write_document(mission, true)
    }

    fn write_document(
        &mut self,
        mission: &Mission,
        make_active: bool,
    ) -> Result<MissionIndexEntry, StoreError> {
        let mut index = self.list_index()?;
        let last_accessed = next_access_stamp(&index, self.now_ms());
        let entry = MissionIndexEntry {
            id: mission.id().clone(),
            name: mission.name().to_string(),
            last_accessed,
        };
        match index.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => *existing = entry.clone(),
            None => index.push(entry.clone()),
        }

        let mut ops = vec![
            KvOp::Put {
                key: mission_key(mission.id()),
                value: encode(mission)?,
            },
            KvOp::Put {
                key: INDEX_KEY.to_string(),
                value: encode(&index)?,
            },
        ];
        if make_active {
            ops.push(KvOp::Put {
                key: ACTIVE_KEY.to_string(),
                value: mission.id().as_str().to_string(),
            });
        }
        self.kv.write_batch(ops)?;
        debug!(
            mission = %mission.id(),
            last_updated = mission.last_updated(),
            last_accessed,
            "saved mission"
        );
        Ok(entry)
    }

    pub fn list_index(&self) -> Result<Vec<MissionIndexEntry>, StoreError> {
        match self.kv.get(INDEX_KEY)? {
            Some(raw) => Ok(decode(INDEX_KEY, &raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Marks a mission as just accessed without rewriting its document.
    pub fn touch(&mut self, id: &MissionId) -> Result<MissionIndexEntry, StoreError> {
        self.record_access(id, false)
    }

    /// Bumps the access stamp and moves the last-active pointer in one batch.
    pub fn activate(&mut self, id: &MissionId) -> Result<MissionIndexEntry, StoreError> {
        self.record_access(id, true)
    }

    fn record_access(
        &mut self,
        id: &MissionId,
        make_active: bool,
    ) -> Result<MissionIndexEntry, StoreError> {
        let mut index = self.list_index()?;
        let last_accessed = next_access_stamp(&index, self.now_ms());
        let Some(entry) = index.iter_mut().find(|entry| &entry.id == id) else {
            return Err(StoreError::mission_not_found(id));
        };
        entry.last_accessed = last_accessed;
        let touched = entry.clone();
        let mut ops = vec![KvOp::Put {
            key: INDEX_KEY.to_string(),
            value: encode(&index)?,
        }];
        if make_active {
            ops.push(KvOp::Put {
                key: ACTIVE_KEY.to_string(),
                value: id.as_str().to_string(),
            });
        }
        self.kv.write_batch(ops)?;
        Ok(touched)
    }

    pub fn most_recent(
        &self,
        exclude: Option<&MissionId>,
    ) -> Result<Option<MissionIndexEntry>, StoreError> {
        Ok(self
            .list_index()?
            .into_iter()
            .filter(|entry| Some(&entry.id) != exclude)
            .max_by_key(|entry| entry.last_accessed))
    }

    /// Deletes the document and its index entry together. A last-active pointer naming the
    /// mission is cleared in the same batch.
    pub fn remove_document(&mut self, id: &MissionId) -> Result<(), StoreError> {
        let key = mission_key(id);
        let had_document = self.kv.get(&key)?.is_some();
        let mut index = self.list_index()?;
        let before = index.len();
        index.retain(|entry| &entry.id != id);
        if !had_document && index.len() == before {
            return Err(StoreError::mission_not_found(id));
        }

        let mut ops = vec![
            KvOp::Remove { key },
            KvOp::Put {
                key: INDEX_KEY.to_string(),
                value: encode(&index)?,
            },
        ];
        if self.active_id()?.as_ref() == Some(id) {
            ops.push(KvOp::Remove {
                key: ACTIVE_KEY.to_string(),
            });
        }
        self.kv.write_batch(ops)?;
        debug!(mission = %id, "removed mission document");
        Ok(())
    }

    pub fn active_id(&self) -> Result<Option<MissionId>, StoreError> {
        let Some(raw) = self.kv.get(ACTIVE_KEY)? else {
            return Ok(None);
        };
        match MissionId::try_new(raw.clone()) {
            Ok(id) => Ok(Some(id)),
            Err(err) => {
                warn!(value = %raw, error = %err, "ignoring malformed active mission pointer");
                Ok(None)
            }
        }
    }

    pub fn set_active_id(&mut self, id: &MissionId) -> Result<(), StoreError> {
        self.kv.put(ACTIVE_KEY, id.as_str())?;
        Ok(())
    }

    pub fn clear_active_id(&mut self) -> Result<bool, StoreError> {
        Ok(self.kv.remove(ACTIVE_KEY)?)
    }

    pub fn user_profile(&self) -> Result<Option<UserProfile>, StoreError> {
        match self.kv.get(PROFILE_KEY)? {
            Some(raw) => Ok(Some(decode(PROFILE_KEY, &raw)?)),
            None => Ok(None),
        }
    }

    pub fn save_user_profile(&mut self, profile: &UserProfile) -> Result<(), StoreError> {
        self.kv.put(PROFILE_KEY, &encode(profile)?)?;
        Ok(())
    }

    pub fn clear_user_profile(&mut self) -> Result<bool, StoreError> {
        Ok(self.kv.remove(PROFILE_KEY)?)
    }

    /// Restores index/document agreement after an unclean shutdown or manual tampering.
    pub fn recover(&mut self) -> Result<RecoveryReport, StoreError> {
        let mut report = RecoveryReport::default();
        let stored_keys = self.kv.keys_with_prefix(MISSION_KEY_PREFIX)?;
        let stored: BTreeSet<&str> = stored_keys
            .iter()
            .filter_map(|key| key.strip_prefix(MISSION_KEY_PREFIX))
            .collect();

        let original = self.list_index()?;
        let mut index: Vec<MissionIndexEntry> = Vec::with_capacity(original.len());
        for entry in original {
            if !stored.contains(entry.id.as_str()) {
                warn!(mission = %entry.id, "dropping index entry without document");
                report.dropped_entries.push(entry.id);
                continue;
            }
            if let Some(seen) = index.iter_mut().find(|seen| seen.id == entry.id) {
                warn!(mission = %entry.id, "dropping duplicate index entry");
                if entry.last_accessed > seen.last_accessed {
                    *seen = entry.clone();
                }
                report.dropped_entries.push(entry.id);
                continue;
            }
            index.push(entry);
        }

        for key in &stored_keys {
            let Some(raw_id) = key.strip_prefix(MISSION_KEY_PREFIX) else {
                continue;
            };
            if index.iter().any(|entry| entry.id.as_str() == raw_id) {
                continue;
            }
            let Some(raw) = self.kv.get(key)? else {
                continue;
            };
            let id = MissionId::try_new(raw_id);
            match (id, decode::<Mission>(key, &raw)) {
                (Ok(id), Ok(mission)) => {
                    warn!(mission = %id, "re-indexing document without index entry");
                    index.push(MissionIndexEntry {
                        id: id.clone(),
                        name: mission.name().to_string(),
                        last_accessed: mission.last_updated(),
                    });
                    report.reindexed.push(id);
                }
                _ => {
                    warn!(key = %key, "leaving undecodable mission document in place");
                    report.corrupt_keys.push(key.clone());
                }
            }
        }

        if !report.dropped_entries.is_empty() || !report.reindexed.is_empty() {
            self.kv.put(INDEX_KEY, &encode(&index)?)?;
        }

        if let Some(active) = self.active_id()?
            && !index.iter().any(|entry| entry.id == active)
        {
            warn!(mission = %active, "clearing dangling active mission pointer");
            self.kv.remove(ACTIVE_KEY)?;
            report.cleared_active = true;
        }

        Ok(report)
    }
}

fn mission_key(id: &MissionId) -> String {
    format!("{MISSION_KEY_PREFIX}{id}")
}

/// Access stamps are strictly increasing across the index so "most recent" is a total order.
fn next_access_stamp(index: &[MissionIndexEntry], now_ms: i64) -> i64 {
    match index.iter().map(|entry| entry.last_accessed).max() {
        Some(latest) => now_ms.max(latest.saturating_add(1)),
        None => now_ms,
    }
}

fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, StorageFailure> {
    serde_json::to_string(value).map_err(StorageFailure::Encode)
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, StorageFailure> {
    serde_json::from_str(raw).map_err(|source| StorageFailure::Corrupt {
        key: key.to_string(),
        source,
    })
}
