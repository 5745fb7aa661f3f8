//! JSON key-value persistence
//!
//! Each key maps to one pretty-printed JSON file under the data directory.
//! Values are small (goal lists, mood state, journals), so whole-file
//! rewrite per save is fine.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::Result;

/// File-backed key-value store for memory state
#[derive(Debug, Clone)]
pub struct KvStore {
    dir: PathBuf,
}

impl KvStore {
    /// Open a store rooted at `dir`, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Path of the file backing `key`
    #[must_use]
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Root directory of the store
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the value stored under `key`, or `None` if absent
    ///
    /// # Errors
    ///
    /// Returns error on I/O failure or malformed JSON
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let value = serde_json::from_str(&contents)?;
        Ok(Some(value))
    }

    /// Save `value` under `key`, replacing any previous value
    ///
    /// # Errors
    ///
    /// Returns error on I/O or serialization failure
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let contents = serde_json::to_string_pretty(value)?;
        std::fs::write(self.path(key), contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();

        store.save("items", &vec!["a".to_string(), "b".to_string()]).unwrap();
        let loaded: Option<Vec<String>> = store.load("items").unwrap();
        assert_eq!(loaded.unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = KvStore::open(dir.path()).unwrap();

        let loaded: Option<Vec<String>> = store.load("nothing").unwrap();
        assert!(loaded.is_none());
    }
}
