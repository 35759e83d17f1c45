//! Durable key-value storage trait.

use crate::Result;

/// A synchronous string key-value store that survives process restarts.
///
/// Single-key operations are atomic. `set_many` and `remove_many` default to
/// one key at a time; implementations that can apply a batch atomically
/// should override them.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Write several values.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Remove several values.
    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}
