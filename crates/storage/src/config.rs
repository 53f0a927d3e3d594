#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

pub const DEFAULT_STORAGE_DIR: &str = ".mission_store";
pub const DEFAULT_DB_FILE: &str = "mission_store.db";
pub const DEFAULT_MISSION_NAME: &str = "New Mission";

pub const ENV_STORAGE_DIR: &str = "MISSION_STORE_DIR";
pub const ENV_DEFAULT_NAME: &str = "MISSION_STORE_DEFAULT_NAME";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_dir: PathBuf,
    pub db_file_name: String,
    /// Name given to the mission synthesized on cold start or after deleting the last one.
    pub default_mission_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            db_file_name: DEFAULT_DB_FILE.to_string(),
            default_mission_name: DEFAULT_MISSION_NAME.to_string(),
        }
    }
}

impl StoreConfig {
    pub fn new(storage_dir: impl AsRef<Path>) -> Self {
        Self {
            storage_dir: storage_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = non_blank(lookup(ENV_STORAGE_DIR)) {
            config.storage_dir = PathBuf::from(dir);
        }
        if let Some(name) = non_blank(lookup(ENV_DEFAULT_NAME)) {
            config.default_mission_name = name;
        }
        config
    }

    pub fn db_path(&self) -> PathBuf {
        self.storage_dir.join(&self.db_file_name)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_overrides_defaults() {
        let config = StoreConfig::from_lookup(|key| match key {
            ENV_STORAGE_DIR => Some("/var/lib/missions".to_string()),
            ENV_DEFAULT_NAME => Some(" Launchpad ".to_string()),
            _ => None,
        });
        assert_eq!(config.storage_dir, PathBuf::from("/var/lib/missions"));
        assert_eq!(config.default_mission_name, "Launchpad");
        assert_eq!(
            config.db_path(),
            PathBuf::from("/var/lib/missions").join(DEFAULT_DB_FILE)
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = StoreConfig::from_lookup(|_| Some("   ".to_string()));
        assert_eq!(config, StoreConfig::default());
    }
}
