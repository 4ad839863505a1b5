//! Persisted manifest of known hooks
//!
//! The manifest is the single source of truth on disk:
//! `{ "last_remote_check": epoch-seconds|null, "hooks": { name: record } }`.
//! It is rewritten wholesale after every mutating operation; the full-document
//! replace means a crash mid-write never leaves a semantically half-updated
//! file behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::hook::HookRecord;

/// The manifest document as stored in `hooks/hooks.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestDocument {
    /// Epoch seconds of the last `check_for_updates`, if any.
    #[serde(default)]
    pub last_remote_check: Option<i64>,

    /// All known hooks, keyed by name.
    #[serde(default)]
    pub hooks: BTreeMap<String, HookRecord>,
}

/// Loads and rewrites the manifest document.
///
/// No internal locking: callers serialize access, concurrent processes are
/// unsupported.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the manifest, creating an empty document on first use.
    ///
    /// A structurally invalid file is reset to an empty document rather than
    /// failing the whole process; the stale content is reported via `warn`.
    pub fn load(&self) -> Result<ManifestDocument> {
        if !self.path.is_file() {
            let document = ManifestDocument::default();
            self.save(&document)?;
            return Ok(document);
        }

        let raw = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str(&raw) {
            Ok(document) => Ok(document),
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "manifest is not parseable, resetting to an empty document"
                );
                let document = ManifestDocument::default();
                self.save(&document)?;
                Ok(document)
            }
        }
    }

    /// Serialize and replace the manifest file in one write.
    pub fn save(&self, document: &ManifestDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(document)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_creates_empty_document_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join("hooks/hooks.json"));

        let document = store.load().unwrap();
        assert!(document.hooks.is_empty());
        assert!(document.last_remote_check.is_none());
        assert!(store.path().is_file());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ManifestStore::new(dir.path().join("hooks.json"));

        let mut document = ManifestDocument::default();
        document.last_remote_check = Some(1_700_000_000);
        let mut record = HookRecord::new("demo-hook");
        record.enabled = true;
        record.installed = true;
        document.hooks.insert(record.name.clone(), record);
        store.save(&document).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.last_remote_check, Some(1_700_000_000));
        assert!(loaded.hooks["demo-hook"].enabled);
    }

    #[test]
    fn corrupt_manifest_resets_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hooks.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = ManifestStore::new(&path);
        let document = store.load().unwrap();
        assert!(document.hooks.is_empty());

        // The reset was persisted, not just returned.
        let reloaded: ManifestDocument =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(reloaded.hooks.is_empty());
    }
}
