//! Abstract interfaces the engine depends on but does not implement
//! (spec §6 "external collaborators"): a version-control repository, a
//! key/value config store, a managed-saves blob directory, and a progress
//! sink. The engine is generic over these so the GUI shell, CLI tooling,
//! or tests can each supply their own.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;

use crate::error::Result;
use crate::operation::Operation;

/// The version-control system a save's mirror is committed into. The
/// engine only ever stages paths and asks for a commit; it never shells
/// out to a particular VCS itself.
pub trait Repository: Send + Sync {
    /// Stages the given mirror-relative paths for the next commit.
    fn stage(&self, paths: &[String]) -> Result<()>;

    /// Commits everything currently staged, returning the new commit hash.
    fn commit(&self, message: &str) -> Result<String>;

    /// The hash of the current head commit, or `None` for a fresh
    /// repository with no history yet.
    fn head_hash(&self) -> Result<Option<String>>;

    /// The bytes of `relpath` as they existed at `commit`, or `None` if
    /// that path didn't exist at that commit.
    fn read_at(&self, commit: &str, relpath: &str) -> Result<Option<Vec<u8>>>;

    /// Whether `ancestor` is `descendant` or one of its ancestors. Used by
    /// [`crate::translate::rebuild`] to decide which manifest entries are
    /// eligible for a given target commit.
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool>;
}

/// A small key/value store for engine and shell settings that aren't part
/// of a save's own state.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// An in-memory [`ConfigStore`], primarily for tests.
#[derive(Default)]
pub struct MemoryConfigStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.lock().unwrap().insert(key.to_owned(), value);
        Ok(())
    }
}

/// A [`ConfigStore`] backed by a single JSON file, rewritten whole on
/// every [`ConfigStore::set`] via the same write-then-rename discipline
/// the manifest uses.
pub struct JsonFileConfigStore {
    path: PathBuf,
    cache: Mutex<HashMap<String, Value>>,
}

impl JsonFileConfigStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cache = if path.exists() {
            let bytes = std::fs::read(&path)?;
            serde_json::from_slice(&bytes).unwrap_or_default()
        } else {
            HashMap::new()
        };
        Ok(Self { path, cache: Mutex::new(cache) })
    }
}

impl ConfigStore for JsonFileConfigStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.cache.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut cache = self.cache.lock().unwrap();
        cache.insert(key.to_owned(), value);
        let bytes = serde_json::to_vec_pretty(&*cache)?;
        crate::atomic::write_atomic(&self.path, &bytes)
    }
}

/// The directory of saves the shell manages, each described by a JSON
/// descriptor file. The engine only needs to enumerate them; it has no
/// opinion on descriptor schema beyond a save root path.
pub trait BlobStorage: Send + Sync {
    /// Every managed save's root directory.
    fn list_saves(&self) -> Result<Vec<PathBuf>>;

    /// Raw descriptor bytes for a given save root, if one is registered.
    fn descriptor(&self, save_root: &Path) -> Result<Option<Vec<u8>>>;
}

/// Receives [`Operation`] snapshots as a long-running extract/rebuild
/// progresses. Implemented by whatever the caller uses to surface
/// progress (a GUI view model, a CLI spinner, a test probe).
pub trait ProgressSink: Send + Sync {
    fn on_update(&self, operation: &Operation);
}

/// A [`ProgressSink`] that discards every update, for callers that poll
/// [`crate::operation::OperationManager`] directly instead.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_update(&self, _operation: &Operation) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_config_store_round_trips() {
        let store = MemoryConfigStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", Value::from(42)).unwrap();
        assert_eq!(store.get("k").unwrap(), Some(Value::from(42)));
    }

    #[test]
    fn json_file_config_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        {
            let store = JsonFileConfigStore::open(&path).unwrap();
            store.set("theme", Value::from("dark")).unwrap();
        }
        let reopened = JsonFileConfigStore::open(&path).unwrap();
        assert_eq!(reopened.get("theme").unwrap(), Some(Value::from("dark")));
    }
}
