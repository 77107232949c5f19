//! Namespaced key/value storage
//!
//! Mirrors the browser `localStorage` contract: string keys, string
//! values, whole-value reads and writes. `FileStorage` keeps every key in
//! one JSON object on disk; `MemoryStorage` is for tests and ephemeral runs.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{BoardError, Result};

pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Read and decode a JSON value stored under `key`.
///
/// Missing keys, unreadable storage and malformed JSON all come back as
/// `None`; the latter two are logged.
pub fn load_json<T: DeserializeOwned>(storage: &dyn LocalStorage, key: &str) -> Option<T> {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "Failed to read local storage, using defaults");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Discarding malformed persisted data");
            None
        }
    }
}

/// Encode `value` as JSON and store it under `key`
pub fn store_json<T: Serialize>(storage: &dyn LocalStorage, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    storage.set_item(key, &raw)
}

/// Storage backed by a single JSON file mapping keys to string values
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within the process
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&raw).map_err(|e| {
            BoardError::Storage(format!("{} is not a key/value object: {e}", self.path.display()))
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write to a sibling file first so a crash never leaves a truncated store
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.guard();
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.guard();
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(BoardError::Storage(reason)) => {
                warn!(path = %self.path.display(), %reason, "Replacing corrupt storage file");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)?;
        debug!(key, bytes = value.len(), "Persisted local storage item");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let _guard = self.guard();
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("rlboard-storage-{}", uuid::Uuid::new_v4()))
            .join("local_storage.json")
    }

    #[test]
    fn test_file_storage_round_trip() {
        let path = temp_path();
        let storage = FileStorage::new(&path);

        assert_eq!(storage.get_item("a").unwrap(), None);
        storage.set_item("a", "1").unwrap();
        storage.set_item("b", "{\"x\":true}").unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get_item("a").unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get_item("b").unwrap().as_deref(), Some("{\"x\":true}"));

        reopened.remove_item("a").unwrap();
        assert_eq!(storage.get_item("a").unwrap(), None);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_file_is_replaced_on_write() {
        let path = temp_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json at all").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(storage.get_item("k"), Err(BoardError::Storage(_))));

        storage.set_item("k", "v").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("v"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_json_treats_malformed_as_absent() {
        let storage = MemoryStorage::new();
        storage.set_item("prefs", "{\"isDarkMode\": tru").unwrap();

        let loaded: Option<serde_json::Value> = load_json(&storage, "prefs");
        assert!(loaded.is_none());

        store_json(&storage, "prefs", &serde_json::json!({"isDarkMode": true})).unwrap();
        let loaded: Option<serde_json::Value> = load_json(&storage, "prefs");
        assert_eq!(loaded.unwrap()["isDarkMode"], true);
    }
}
