#![forbid(unsafe_code)]

use super::{KvOp, KvStore};
use crate::error::StorageFailure;
use std::collections::BTreeMap;

/// Process-local medium for tests and throwaway sessions.
#[derive(Clone, Debug, Default)]
pub struct MemoryKv {
    entries: BTreeMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StorageFailure> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), StorageFailure> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool, StorageFailure> {
        Ok(self.entries.remove(key).is_some())
    }

    fn write_batch(&mut self, ops: Vec<KvOp>) -> Result<(), StorageFailure> {
        for op in ops {
            match op {
                KvOp::Put { key, value } => {
                    self.entries.insert(key, value);
                }
                KvOp::Remove { key } => {
                    self.entries.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageFailure> {
        Ok(self
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
