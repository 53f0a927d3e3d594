#![forbid(unsafe_code)]

use crate::error::{StorageFailure, StoreError};
use mission_core::Mission;

const FILE_SUFFIX: &str = ".mission.json";
const FALLBACK_STEM: &str = "mission";

/// A portable, self-contained copy of one mission. Carries nothing from the index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub fn export(mission: &Mission) -> Result<Snapshot, StoreError> {
    let bytes = serde_json::to_vec_pretty(mission).map_err(StorageFailure::Encode)?;
    Ok(Snapshot {
        file_name: file_name_for(mission.name()),
        bytes,
    })
}

/// Decodes bytes produced by [`export`]. Malformed input, a blank name or a repeated item id
/// is the caller's error.
pub fn decode(bytes: &[u8]) -> Result<Mission, StoreError> {
    let mission: Mission = serde_json::from_slice(bytes).map_err(invalid)?;
    mission.validate().map_err(invalid)?;
    Ok(mission)
}

fn invalid(err: impl std::fmt::Display) -> StoreError {
    StoreError::InvalidInput(format!("invalid mission snapshot: {err}"))
}

/// `"Acme Rockets, Inc."` becomes `"acme-rockets-inc.mission.json"`.
pub fn file_name_for(display_name: &str) -> String {
    let mut stem = String::with_capacity(display_name.len());
    let mut pending_dash = false;
    for ch in display_name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !stem.is_empty() {
                stem.push('-');
            }
            pending_dash = false;
            stem.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if stem.is_empty() {
        stem.push_str(FALLBACK_STEM);
    }
    format!("{stem}{FILE_SUFFIX}")
}
