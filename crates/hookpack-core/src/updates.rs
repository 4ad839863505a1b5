//! Outdated-version side-cache
//!
//! `check_for_updates` persists the latest known version per hook into
//! `hooks/outdated.json` so `outdated(name)` can answer without a network
//! round-trip. The cache is only refreshed by an explicit check; stale
//! answers are documented behavior, not a bug.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::warn;

use crate::error::Result;

/// Lookup table of hook name to latest available version.
#[derive(Debug, Clone, Default)]
pub struct OutdatedCache {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl OutdatedCache {
    /// Load the cache; a missing or unparseable file yields an empty cache.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = if path.is_file() {
            match std::fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|raw| serde_json::from_str(&raw).map_err(|e| e.to_string()))
            {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "ignoring unreadable outdated cache");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };
        Self { path, entries }
    }

    /// Latest known version for the hook, if an explicit check recorded one.
    pub fn latest(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|v| v.as_str())
    }

    /// Merge entries into the cache and persist. Names absent from
    /// `entries` keep their previously recorded version.
    pub fn merge(&mut self, entries: BTreeMap<String, String>) -> Result<()> {
        let mut merged = self.entries.clone();
        merged.extend(entries);
        self.store(merged)
    }

    /// Replace the cache contents and persist them.
    pub fn store(&mut self, entries: BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        self.entries = entries;
        Ok(())
    }
}
