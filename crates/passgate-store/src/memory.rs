//! In-process key-value storage.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use passgate_core::{KeyValueStorage, Result};

/// Key-value storage that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.remove_many(&[key])
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in pairs {
            entries.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}
