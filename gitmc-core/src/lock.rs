//! Per-save exclusivity (spec §4.7 concurrency policy): extract and
//! rebuild on the same save are mutually exclusive; distinct saves run
//! independently.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{CoreError, Result};

#[derive(Clone, Default)]
pub struct SaveLocks {
    held: Arc<Mutex<HashSet<PathBuf>>>,
}

impl SaveLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `save_root`, or [`CoreError::Busy`] if
    /// another operation already holds it. The lock releases when the
    /// returned guard drops.
    pub fn acquire(&self, save_root: &Path) -> Result<SaveLockGuard> {
        let mut held = self.held.lock().unwrap();
        if !held.insert(save_root.to_owned()) {
            return Err(CoreError::Busy(save_root.to_owned()));
        }
        Ok(SaveLockGuard { held: self.held.clone(), save_root: save_root.to_owned() })
    }
}

pub struct SaveLockGuard {
    held: Arc<Mutex<HashSet<PathBuf>>>,
    save_root: PathBuf,
}

impl Drop for SaveLockGuard {
    fn drop(&mut self) {
        self.held.lock().unwrap().remove(&self.save_root);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn second_acquire_on_same_save_is_busy() {
        let locks = SaveLocks::new();
        let save = PathBuf::from("/saves/world1");
        let _guard = locks.acquire(&save).unwrap();
        assert!(matches!(locks.acquire(&save), Err(CoreError::Busy(_))));
    }

    #[test]
    fn lock_releases_on_drop() {
        let locks = SaveLocks::new();
        let save = PathBuf::from("/saves/world1");
        {
            let _guard = locks.acquire(&save).unwrap();
        }
        assert!(locks.acquire(&save).is_ok());
    }

    #[test]
    fn distinct_saves_do_not_contend() {
        let locks = SaveLocks::new();
        let _a = locks.acquire(&PathBuf::from("/saves/a")).unwrap();
        assert!(locks.acquire(&PathBuf::from("/saves/b")).is_ok());
    }
}
