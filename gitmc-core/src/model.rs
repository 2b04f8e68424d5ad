//! On-disk JSON state: stamps (one per translated artifact) and the
//! mirror-wide manifest (spec §6).

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// A manifest entry's `commit` field: the literal `"init"`/`"pending"`
/// sentinels, or a concrete commit hash once finalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitState {
    Init,
    Pending,
    Hash(String),
}

impl CommitState {
    pub fn as_str(&self) -> &str {
        match self {
            CommitState::Init => "init",
            CommitState::Pending => "pending",
            CommitState::Hash(h) => h,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CommitState::Pending)
    }
}

impl fmt::Display for CommitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CommitState {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CommitState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct CommitStateVisitor;
        impl Visitor<'_> for CommitStateVisitor {
            type Value = CommitState;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"init\", \"pending\", or a commit hash string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<CommitState, E> {
                Ok(match v {
                    "init" => CommitState::Init,
                    "pending" => CommitState::Pending,
                    other => CommitState::Hash(other.to_owned()),
                })
            }
        }
        deserializer.deserialize_str(CommitStateVisitor)
    }
}

/// One line of the manifest: where a mirrored SNBT artifact stands with
/// respect to the repository collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub commit: CommitState,
    #[serde(default)]
    pub deleted: bool,
}

/// The whole-mirror index: forward-slash-relative SNBT path (from
/// `<save>/GitMC/`) to its commit/deletion state. Serialized as a single
/// JSON object and always rewritten whole (write-then-rename) to avoid
/// torn state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::ManifestCorrupt(path.to_owned(), e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        crate::atomic::write_atomic(path, &bytes)
    }

    pub fn get(&self, relpath: &str) -> Option<&ManifestEntry> {
        self.entries.get(relpath)
    }

    /// Marks an artifact as newly written or changed: its commit becomes
    /// `"pending"` and any prior deletion flag is cleared.
    pub fn mark_pending(&mut self, relpath: impl Into<String>) {
        self.entries.insert(
            relpath.into(),
            ManifestEntry { commit: CommitState::Pending, deleted: false },
        );
    }

    /// Marks an artifact whose source file disappeared. The entry is kept
    /// (not removed) so history-aware rebuilds of older commits still see
    /// it; only its `deleted` flag flips.
    pub fn mark_deleted(&mut self, relpath: &str) {
        if let Some(entry) = self.entries.get_mut(relpath) {
            entry.deleted = true;
        } else {
            self.entries.insert(
                relpath.to_owned(),
                ManifestEntry { commit: CommitState::Pending, deleted: true },
            );
        }
    }

    /// Replaces every `"pending"` entry's commit with `hash`. The only
    /// writer of a concrete commit hash into the manifest (spec §4.7).
    pub fn finalize_commit(&mut self, hash: &str) {
        for entry in self.entries.values_mut() {
            if entry.commit.is_pending() {
                entry.commit = CommitState::Hash(hash.to_owned());
            }
        }
    }

    /// True once no entry holds `"pending"` — the property a successful
    /// commit must establish.
    pub fn is_finalized(&self) -> bool {
        self.entries.values().all(|e| !e.commit.is_pending())
    }

    /// Paths whose `deleted == false` and whose commit is at or before
    /// `target_commit` in the caller-supplied ancestry ordering. The
    /// engine itself does not know commit ancestry; callers pass an
    /// `is_eligible` predicate grounded in the repository collaborator.
    pub fn paths_at<'a>(
        &'a self,
        mut is_eligible: impl FnMut(&CommitState) -> bool,
    ) -> Vec<&'a str> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.deleted && is_eligible(&entry.commit))
            .map(|(path, _)| path.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ManifestEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Per-artifact translation provenance, written alongside every SNBT file
/// (spec §6 stamp file layout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    #[serde(rename = "OriginalPath")]
    pub original_path: String,
    #[serde(rename = "OriginalHash")]
    pub original_hash: String,
    #[serde(rename = "OriginalLastWriteUtc")]
    pub original_last_write_utc: String,
    #[serde(rename = "Translator")]
    pub translator: String,
    #[serde(rename = "FormatVersion")]
    pub format_version: String,
    #[serde(rename = "TranslatedAtUtc")]
    pub translated_at_utc: String,
    #[serde(rename = "Notes")]
    pub notes: Option<String>,
}

impl Stamp {
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::StampCorrupt(path.to_owned(), e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(self)?;
        crate::atomic::write_atomic(path, &bytes)
    }

    /// Whether this stamp still authoritatively describes `original_hash`
    /// and `original_last_write_utc`: if so, extraction of that source is
    /// a no-op (spec §8 "stamp authority").
    pub fn matches(&self, original_hash: &str, original_last_write_utc: &str) -> bool {
        self.original_hash == original_hash
            && self.original_last_write_utc == original_last_write_utc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_state_round_trips_through_json() {
        for (state, json) in [
            (CommitState::Init, "\"init\""),
            (CommitState::Pending, "\"pending\""),
            (CommitState::Hash("abc123".into()), "\"abc123\""),
        ] {
            assert_eq!(serde_json::to_string(&state).unwrap(), json);
            assert_eq!(serde_json::from_str::<CommitState>(json).unwrap(), state);
        }
    }

    #[test]
    fn manifest_round_trips_through_json() {
        let mut manifest = Manifest::new();
        manifest.mark_pending("region/r.0.0/chunk_1_2.snbt");
        let json = serde_json::to_string(&manifest).unwrap();
        let back: Manifest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, manifest);
    }

    #[test]
    fn finalize_commit_clears_every_pending_entry() {
        let mut manifest = Manifest::new();
        manifest.mark_pending("a.snbt");
        manifest.mark_pending("b.snbt");
        manifest.finalize_commit("abc123");
        assert!(manifest.is_finalized());
        for (_, entry) in manifest.iter() {
            assert_eq!(entry.commit, CommitState::Hash("abc123".into()));
        }
    }

    #[test]
    fn mark_deleted_preserves_existing_commit_if_present() {
        let mut manifest = Manifest::new();
        manifest.mark_pending("a.snbt");
        manifest.finalize_commit("h1");
        manifest.mark_deleted("a.snbt");
        let entry = manifest.get("a.snbt").unwrap();
        assert!(entry.deleted);
        assert_eq!(entry.commit, CommitState::Hash("h1".into()));
    }
}
