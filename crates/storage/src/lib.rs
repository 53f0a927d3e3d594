#![forbid(unsafe_code)]

//! Persistence and session layer for mission documents.
//!
//! [`KvStore`] is the durable medium, [`MissionRepository`] keeps full documents and the
//! mission index in step on top of it, and [`SessionManager`] owns the active mission and
//! commits every mutation through the repository before returning.

mod clock;
mod config;
mod error;
mod kv;
mod repository;
mod session;
pub mod snapshot;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    DEFAULT_DB_FILE, DEFAULT_MISSION_NAME, DEFAULT_STORAGE_DIR, ENV_DEFAULT_NAME,
    ENV_STORAGE_DIR, StoreConfig,
};
pub use error::{Missing, StorageFailure, StoreError};
pub use kv::{KvOp, KvStore, MemoryKv, SqliteKv};
pub use repository::{MissionRepository, RecoveryReport};
pub use session::SessionManager;
pub use snapshot::Snapshot;

/// Opens the SQLite-backed session described by `config`.
pub fn open_session(config: &StoreConfig) -> Result<SessionManager<SqliteKv>, StoreError> {
    let kv = SqliteKv::open(config)?;
    SessionManager::open(MissionRepository::new(kv), config)
}
