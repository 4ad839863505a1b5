//! Diff-based asset publication
//!
//! A hook declares `source subpath -> destination` mappings. Publishing
//! copies source files under the destination, creating directories as
//! needed, but never clobbers a deployed file the operator has edited:
//! an existing destination file is only rewritten when `force` is set or
//! when its content still equals the pre-update backup snapshot (meaning the
//! operator left it untouched and the upstream change should land).
//! Unpublishing removes only files within the declared mapping, leaving
//! operator-added files in the same folders alone.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::Result;
use crate::hook::Hook;

/// One candidate file of a declared mapping.
struct Candidate {
    source: PathBuf,
    destination: PathBuf,
    backup: Option<PathBuf>,
}

/// Publishes and unpublishes a hook's declared assets.
#[derive(Debug, Clone)]
pub struct AssetPublisher {
    base_path: PathBuf,
}

impl AssetPublisher {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Publish the hook's assets. `backup` is the pre-update snapshot of the
    /// hook directory used for change detection; `force` overwrites
    /// unconditionally. Returns the files actually written.
    pub fn publish(&self, hook: &Hook, backup: Option<&Path>, force: bool) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for candidate in self.candidates(hook, backup)? {
            if !self.should_write(&candidate, force)? {
                debug!(
                    destination = %candidate.destination.display(),
                    "skipping modified deployed asset"
                );
                continue;
            }
            if let Some(parent) = candidate.destination.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&candidate.source, &candidate.destination)?;
            written.push(candidate.destination);
        }
        Ok(written)
    }

    /// Delete published files matching the declared mapping. Returns the
    /// files actually removed.
    pub fn unpublish(&self, hook: &Hook) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for candidate in self.candidates(hook, None)? {
            if candidate.destination.is_file() {
                std::fs::remove_file(&candidate.destination)?;
                removed.push(candidate.destination);
            }
        }
        Ok(removed)
    }

    fn should_write(&self, candidate: &Candidate, force: bool) -> Result<bool> {
        if force || !candidate.destination.exists() {
            return Ok(true);
        }
        let Some(backup) = &candidate.backup else {
            // No snapshot to diff against: leave the deployed file alone.
            return Ok(false);
        };
        if !backup.is_file() {
            return Ok(false);
        }
        let deployed = std::fs::read(&candidate.destination)?;
        let snapshot = std::fs::read(backup)?;
        Ok(deployed == snapshot)
    }

    fn candidates(&self, hook: &Hook, backup: Option<&Path>) -> Result<Vec<Candidate>> {
        let hook_root = hook.path();
        let mut candidates = Vec::new();

        for (source_sub, destination) in hook.assets() {
            let source_root = hook_root.join(&source_sub);
            let destination_root = self.base_path.join(&destination);
            let backup_root = backup.map(|b| b.join(&source_sub));

            if source_root.is_file() {
                candidates.push(Candidate {
                    source: source_root,
                    destination: destination_root,
                    backup: backup_root,
                });
                continue;
            }

            if !source_root.is_dir() {
                continue;
            }

            for entry in WalkDir::new(&source_root)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let relative = entry
                    .path()
                    .strip_prefix(&source_root)
                    .unwrap_or(entry.path())
                    .to_path_buf();
                candidates.push(Candidate {
                    source: entry.path().to_path_buf(),
                    destination: destination_root.join(&relative),
                    backup: backup_root.as_ref().map(|b| b.join(&relative)),
                });
            }
        }

        Ok(candidates)
    }
}

/// Copy a directory tree. Used to snapshot a hook before an update so the
/// publisher can diff against the previously published sources.
pub fn copy_dir_recursive(source: &Path, destination: &Path) -> Result<()> {
    for entry in WalkDir::new(source).into_iter().filter_map(|e| e.ok()) {
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HooksConfig;
    use crate::hook::HookRecord;

    fn hook_with_assets(config: &HooksConfig, name: &str) -> Hook {
        let dir = config.local_hook_dir(name);
        std::fs::create_dir_all(dir.join("resources/assets/scripts")).unwrap();
        std::fs::write(
            dir.join("composer.json"),
            serde_json::json!({
                "name": name,
                "extra": {"hook": {"assets": {
                    "resources/assets": format!("public/vendor/{name}"),
                }}}
            })
            .to_string(),
        )
        .unwrap();
        std::fs::write(dir.join("resources/assets/scripts/alert.js"), "v1").unwrap();
        Hook::new(HookRecord::new(name), config)
    }

    #[test]
    fn publish_copies_new_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = HooksConfig::new(dir.path());
        let hook = hook_with_assets(&config, "demo-hook");

        let publisher = AssetPublisher::new(&config.base_path);
        let written = publisher.publish(&hook, None, false).unwrap();
        assert_eq!(written.len(), 1);

        let deployed = config
            .base_path
            .join("public/vendor/demo-hook/scripts/alert.js");
        assert_eq!(std::fs::read_to_string(deployed).unwrap(), "v1");
    }

    #[test]
    fn operator_edits_survive_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let config = HooksConfig::new(dir.path());
        let hook = hook_with_assets(&config, "demo-hook");
        let publisher = AssetPublisher::new(&config.base_path);
        publisher.publish(&hook, None, false).unwrap();

        // Snapshot of the v1 sources, as taken before an update.
        let backup = tempfile::tempdir().unwrap();
        copy_dir_recursive(&hook.path(), backup.path()).unwrap();

        // Operator edits the deployed copy, upstream ships v2.
        let deployed = config
            .base_path
            .join("public/vendor/demo-hook/scripts/alert.js");
        std::fs::write(&deployed, "edited").unwrap();
        std::fs::write(hook.path().join("resources/assets/scripts/alert.js"), "v2").unwrap();

        let written = publisher.publish(&hook, Some(backup.path()), false).unwrap();
        assert!(written.is_empty());
        assert_eq!(std::fs::read_to_string(&deployed).unwrap(), "edited");

        publisher.publish(&hook, Some(backup.path()), true).unwrap();
        assert_eq!(std::fs::read_to_string(&deployed).unwrap(), "v2");
    }

    #[test]
    fn untouched_deployed_files_get_the_upstream_change() {
        let dir = tempfile::tempdir().unwrap();
        let config = HooksConfig::new(dir.path());
        let hook = hook_with_assets(&config, "demo-hook");
        let publisher = AssetPublisher::new(&config.base_path);
        publisher.publish(&hook, None, false).unwrap();

        let backup = tempfile::tempdir().unwrap();
        copy_dir_recursive(&hook.path(), backup.path()).unwrap();
        std::fs::write(hook.path().join("resources/assets/scripts/alert.js"), "v2").unwrap();

        let written = publisher.publish(&hook, Some(backup.path()), false).unwrap();
        assert_eq!(written.len(), 1);

        let deployed = config
            .base_path
            .join("public/vendor/demo-hook/scripts/alert.js");
        assert_eq!(std::fs::read_to_string(deployed).unwrap(), "v2");
    }

    #[test]
    fn unpublish_leaves_operator_files_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let config = HooksConfig::new(dir.path());
        let hook = hook_with_assets(&config, "demo-hook");
        let publisher = AssetPublisher::new(&config.base_path);
        publisher.publish(&hook, None, false).unwrap();

        let colocated = config.base_path.join("public/vendor/demo-hook/scripts/mine.js");
        std::fs::write(&colocated, "keep me").unwrap();

        let removed = publisher.unpublish(&hook).unwrap();
        assert_eq!(removed.len(), 1);
        assert!(!config
            .base_path
            .join("public/vendor/demo-hook/scripts/alert.js")
            .exists());
        assert!(colocated.is_file());
    }
}
