#![forbid(unsafe_code)]

//! Synchronous persistent key-value medium. The only durability mechanism of the store.

mod memory;
mod sqlite;

pub use memory::MemoryKv;
pub use sqlite::SqliteKv;

use crate::error::StorageFailure;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KvOp {
    Put { key: String, value: String },
    Remove { key: String },
}

pub trait KvStore {
    /// `Ok(None)` means nothing is stored under `key`; it is never replaced by a default.
    fn get(&self, key: &str) -> Result<Option<String>, StorageFailure>;

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageFailure>;

    /// Returns whether a value was removed.
    fn remove(&mut self, key: &str) -> Result<bool, StorageFailure>;

    /// Applies all ops or none of them.
    fn write_batch(&mut self, ops: Vec<KvOp>) -> Result<(), StorageFailure>;

    /// Stored keys starting with `prefix`, in key order.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageFailure>;
}
