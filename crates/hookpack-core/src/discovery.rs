//! Discovery of the authoritative hook set
//!
//! Discovery merges three provenances, in order: the persisted manifest
//! (pruned of entries whose on-disk package descriptor has gone missing),
//! dependency-lock-file entries carrying this system's origin marker, and
//! locally-vendored hook directories. Later sources overwrite earlier ones,
//! but a name that was enabled in the manifest snapshot stays enabled:
//! discovery never silently disables a hook.
//!
//! A directory under `hooks/` that was never installed is invisible: it only
//! enters the set when it is already in the manifest or passed as the
//! just-installed name. This keeps unmanaged scratch folders out of listings.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::config::HooksConfig;
use crate::error::Result;
use crate::hook::{
    merge_record, read_descriptor, read_package_descriptor, HookKind, HookRecord,
};
use crate::manifest::ManifestDocument;

/// Shape of the dependency lock file, reduced to what discovery needs.
#[derive(Debug, Default, Deserialize)]
struct LockFile {
    #[serde(default)]
    packages: Vec<LockPackage>,
}

#[derive(Debug, Deserialize)]
struct LockPackage {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, rename = "notification-url")]
    notification_url: Option<String>,
}

/// Resolve the directory a named hook lives in: local wins over vendored.
fn hook_dir(config: &HooksConfig, name: &str) -> PathBuf {
    let local = config.local_hook_dir(name);
    if local.is_dir() {
        local
    } else {
        config.vendor_hook_dir(name)
    }
}

/// Produce the authoritative `name -> record` mapping.
///
/// `just_installed` widens the local-directory overlay to include one name
/// that is not yet in the manifest, used by `install` right after resolving
/// a new local hook.
pub fn discover(
    config: &HooksConfig,
    manifest: &ManifestDocument,
    just_installed: Option<&str>,
) -> Result<BTreeMap<String, HookRecord>> {
    let enabled_before: BTreeSet<String> = manifest
        .hooks
        .values()
        .filter(|record| record.enabled)
        .map(|record| record.name.clone())
        .collect();

    let mut hooks = BTreeMap::new();

    // Manifest entries, pruned of hooks whose descriptor vanished from disk.
    for (name, record) in &manifest.hooks {
        let dir = hook_dir(config, name);
        let package = read_package_descriptor(&dir)?;
        if package.is_none() {
            debug!(name = %name, "pruning manifest entry with no on-disk descriptor");
            continue;
        }
        let descriptor = read_descriptor(&dir)?;
        let merged = merge_record(Some(record), descriptor.as_ref(), package.as_ref());
        hooks.insert(name.clone(), merged);
    }

    // Lock-file entries tagged with the origin marker are always installed.
    let marker = config.download_marker();
    for package in read_lock(config)? {
        if package.notification_url.as_deref() != Some(marker.as_str()) {
            continue;
        }
        let dir = hook_dir(config, &package.name);
        let descriptor = read_descriptor(&dir)?;
        let package_descriptor = read_package_descriptor(&dir)?;
        let mut record = merge_record(
            manifest.hooks.get(&package.name),
            descriptor.as_ref(),
            package_descriptor.as_ref(),
        );
        if record.name.is_empty() {
            record.name = package.name.clone();
        }
        record.version = package.version.clone();
        if record.description == crate::hook::default_description() {
            if let Some(description) = &package.description {
                record.description = description.clone();
            }
        }
        record.installed = true;
        record.kind = record.kind.or(Some(HookKind::Composer));
        hooks.insert(package.name, record);
    }

    // Locally-vendored directories with a named package descriptor, visible
    // only when already tracked or explicitly just installed.
    let hooks_dir = config.hooks_dir();
    if hooks_dir.is_dir() {
        for entry in std::fs::read_dir(&hooks_dir)? {
            let entry = entry?;
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            let Some(package) = read_package_descriptor(&dir)? else {
                continue;
            };
            let Some(name) = package.name.clone() else {
                continue;
            };
            let known = manifest.hooks.contains_key(&name);
            let fresh = just_installed == Some(name.as_str());
            if !known && !fresh {
                debug!(name = %name, "skipping untracked local directory");
                continue;
            }
            let descriptor = read_descriptor(&dir)?;
            let mut record = merge_record(
                manifest.hooks.get(&name),
                descriptor.as_ref(),
                Some(&package),
            );
            record.kind = Some(HookKind::Local);
            if fresh {
                record.installed = true;
            }
            hooks.insert(name, record);
        }
    }

    // Re-propagate enabled state across the merge.
    for name in &enabled_before {
        if let Some(record) = hooks.get_mut(name) {
            record.enabled = true;
        }
    }

    Ok(hooks)
}

fn read_lock(config: &HooksConfig) -> Result<Vec<LockPackage>> {
    let path = config.lock_file();
    if !path.is_file() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path)?;
    let lock: LockFile = serde_json::from_str(&raw)?;
    Ok(lock.packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestDocument;

    fn write_local_hook(config: &HooksConfig, name: &str) {
        let dir = config.local_hook_dir(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("composer.json"),
            serde_json::json!({"name": name}).to_string(),
        )
        .unwrap();
    }

    fn write_vendor_hook(config: &HooksConfig, name: &str) {
        let dir = config.vendor_hook_dir(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("composer.json"),
            serde_json::json!({"name": name}).to_string(),
        )
        .unwrap();
    }

    fn write_lock(config: &HooksConfig, packages: serde_json::Value) {
        std::fs::write(
            config.lock_file(),
            serde_json::json!({ "packages": packages }).to_string(),
        )
        .unwrap();
    }

    fn manifest_with(records: Vec<HookRecord>) -> ManifestDocument {
        let mut document = ManifestDocument::default();
        for record in records {
            document.hooks.insert(record.name.clone(), record);
        }
        document
    }

    #[test]
    fn discovery_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = HooksConfig::new(dir.path());
        write_local_hook(&config, "demo-hook");

        let mut record = HookRecord::new("demo-hook");
        record.installed = true;
        record.enabled = true;
        let manifest = manifest_with(vec![record]);

        let first = discover(&config, &manifest, None).unwrap();
        let second_manifest = ManifestDocument {
            last_remote_check: None,
            hooks: first.clone(),
        };
        let second = discover(&config, &second_manifest, None).unwrap();
        assert_eq!(first, second);
        assert!(second["demo-hook"].enabled);
    }

    #[test]
    fn stale_manifest_entries_are_pruned() {
        let dir = tempfile::tempdir().unwrap();
        let config = HooksConfig::new(dir.path());
        std::fs::create_dir_all(config.hooks_dir()).unwrap();

        let mut record = HookRecord::new("gone-hook");
        record.installed = true;
        let manifest = manifest_with(vec![record]);

        let hooks = discover(&config, &manifest, None).unwrap();
        assert!(hooks.is_empty());
    }

    #[test]
    fn untracked_local_directories_stay_invisible() {
        let dir = tempfile::tempdir().unwrap();
        let config = HooksConfig::new(dir.path());
        write_local_hook(&config, "scratch-hook");

        let hooks = discover(&config, &ManifestDocument::default(), None).unwrap();
        assert!(hooks.is_empty());

        let hooks = discover(&config, &ManifestDocument::default(), Some("scratch-hook")).unwrap();
        assert!(hooks["scratch-hook"].installed);
        assert_eq!(hooks["scratch-hook"].kind, Some(HookKind::Local));
    }

    #[test]
    fn lock_entries_need_the_origin_marker() {
        let dir = tempfile::tempdir().unwrap();
        let config = HooksConfig::new(dir.path());
        write_vendor_hook(&config, "vendor/tagged");
        write_vendor_hook(&config, "vendor/untagged");
        write_lock(
            &config,
            serde_json::json!([
                {
                    "name": "vendor/tagged",
                    "version": "v1.0.0",
                    "notification-url": config.download_marker(),
                },
                {
                    "name": "vendor/untagged",
                    "version": "v2.0.0",
                    "notification-url": "https://elsewhere.test/downloads",
                },
            ]),
        );

        let hooks = discover(&config, &ManifestDocument::default(), None).unwrap();
        assert_eq!(hooks.len(), 1);
        let tagged = &hooks["vendor/tagged"];
        assert!(tagged.installed);
        assert_eq!(tagged.version.as_deref(), Some("v1.0.0"));
        assert_eq!(tagged.kind, Some(HookKind::Composer));
    }

    #[test]
    fn enabled_state_survives_overlays() {
        let dir = tempfile::tempdir().unwrap();
        let config = HooksConfig::new(dir.path());
        write_vendor_hook(&config, "vendor/demo");
        write_lock(
            &config,
            serde_json::json!([{
                "name": "vendor/demo",
                "version": "v1.1.0",
                "notification-url": config.download_marker(),
            }]),
        );

        let mut record = HookRecord::new("vendor/demo");
        record.installed = true;
        record.enabled = true;
        record.version = Some("v1.0.0".to_string());
        let manifest = manifest_with(vec![record]);

        let hooks = discover(&config, &manifest, None).unwrap();
        let demo = &hooks["vendor/demo"];
        assert!(demo.enabled, "overlay must not silently disable the hook");
        assert_eq!(demo.version.as_deref(), Some("v1.1.0"));
    }
}
