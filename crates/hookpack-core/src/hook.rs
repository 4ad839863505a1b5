//! Hook records and the in-memory hook entity
//!
//! A [`HookRecord`] is what the manifest persists for one hook. The
//! [`Hook`] entity wraps a record with the paths it resolves to on disk and
//! exposes derived attributes (providers, aliases, migration/seed/asset
//! declarations) read from the hook's package descriptor at access time.
//! Derived attributes are never cached beyond the current process and never
//! written back to the manifest.
//!
//! Records are built by merging up to three sources with defined precedence:
//! the persisted manifest record, the hook's own `hook.json` descriptor and
//! its `composer.json` package descriptor. The merge is a pure function
//! ([`merge_record`]) so precedence can be tested without a filesystem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::HooksConfig;

pub(crate) fn default_description() -> String {
    "This is a hook.".to_string()
}

/// Provenance of a hook package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookKind {
    /// Lives under the local `hooks/` directory.
    Local,
    /// Distributed as a GitHub zipball.
    Github,
    /// Fetched from the remote registry through the dependency manager.
    Composer,
}

/// Persisted state of one hook, keyed by name in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookRecord {
    /// Unique package-style identifier. Immutable once created.
    pub name: String,

    /// Free-text description.
    #[serde(default = "default_description")]
    pub description: String,

    /// Resolved version. `None` for unversioned local hooks.
    #[serde(default)]
    pub version: Option<String>,

    /// Provenance tag, serialized as `type`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<HookKind>,

    /// Whether the hook's providers should be registered by the host.
    #[serde(default)]
    pub enabled: bool,

    /// Whether the hook has completed an install.
    #[serde(default)]
    pub installed: bool,

    /// Lifecycle-event name to ordered shell commands, run from the hook
    /// directory when that event fires.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<String, Vec<String>>,
}

impl HookRecord {
    /// A fresh record in the `Unknown -> Downloaded` stage.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: default_description(),
            version: None,
            kind: None,
            enabled: false,
            installed: false,
            scripts: BTreeMap::new(),
        }
    }
}

/// The hook's own `hook.json` descriptor.
///
/// Only these fields are merged onto the record; everything else a hook wants
/// to declare belongs in the package descriptor's `extra.hook` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<String, Vec<String>>,
}

/// The hook's package descriptor (`composer.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub extra: ExtraSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtraSection {
    #[serde(default)]
    pub hook: HookExtra,
}

/// Declarations under `extra.hook` in the package descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookExtra {
    #[serde(default)]
    pub providers: Vec<String>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub migrations: Vec<String>,
    #[serde(default)]
    pub seeders: Vec<String>,
    #[serde(default)]
    pub unseeders: Vec<String>,
    #[serde(default)]
    pub assets: BTreeMap<String, String>,
}

/// Merge the three record sources into one canonical record.
///
/// Precedence, lowest to highest: package descriptor (name and description
/// fallback), manifest record, `hook.json` descriptor (description, enabled
/// and scripts when present). The descriptor only overrides `enabled` when it
/// explicitly carries the key, so a disable persisted in the manifest is not
/// undone by a descriptor that stays silent.
pub fn merge_record(
    manifest: Option<&HookRecord>,
    descriptor: Option<&HookDescriptor>,
    package: Option<&PackageDescriptor>,
) -> HookRecord {
    let name = manifest
        .map(|r| r.name.clone())
        .or_else(|| package.and_then(|p| p.name.clone()))
        .unwrap_or_default();

    let mut record = manifest.cloned().unwrap_or_else(|| HookRecord::new(&name));

    if record.description == default_description() {
        if let Some(description) = package.and_then(|p| p.description.clone()) {
            record.description = description;
        }
    }

    if let Some(descriptor) = descriptor {
        if let Some(description) = &descriptor.description {
            record.description = description.clone();
        }
        if let Some(enabled) = descriptor.enabled {
            record.enabled = enabled;
        }
        if !descriptor.scripts.is_empty() {
            record.scripts = descriptor.scripts.clone();
        }
    }

    record
}

/// Read a hook's `hook.json`, if present.
pub fn read_descriptor(dir: &Path) -> crate::Result<Option<HookDescriptor>> {
    let path = dir.join("hook.json");
    if !path.is_file() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Read a hook's package descriptor, if present.
pub fn read_package_descriptor(dir: &Path) -> crate::Result<Option<PackageDescriptor>> {
    let path = dir.join("composer.json");
    if !path.is_file() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

/// One hook with its record and resolved on-disk location.
#[derive(Debug, Clone)]
pub struct Hook {
    record: HookRecord,
    hooks_dir: PathBuf,
    vendor_dir: PathBuf,
}

impl Hook {
    pub fn new(record: HookRecord, config: &HooksConfig) -> Self {
        Self {
            record,
            hooks_dir: config.hooks_dir(),
            vendor_dir: config.vendor_dir(),
        }
    }

    pub fn record(&self) -> &HookRecord {
        &self.record
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// A hook is local when its directory exists under `hooks/`.
    pub fn is_local(&self) -> bool {
        self.hooks_dir.join(&self.record.name).is_dir()
    }

    /// Resolve the hook's directory: local hooks win over vendored copies.
    pub fn path(&self) -> PathBuf {
        if self.is_local() {
            self.hooks_dir.join(&self.record.name)
        } else {
            self.vendor_dir.join(&self.record.name)
        }
    }

    fn extra(&self) -> HookExtra {
        read_package_descriptor(&self.path())
            .ok()
            .flatten()
            .map(|p| p.extra.hook)
            .unwrap_or_default()
    }

    /// Service providers to register while the hook is enabled.
    pub fn providers(&self) -> Vec<String> {
        self.extra().providers
    }

    /// Alias-to-class mapping to register while the hook is enabled.
    pub fn aliases(&self) -> BTreeMap<String, String> {
        self.extra().aliases
    }

    /// Migration files, expanded from the declared files or directories in
    /// declaration order, each directory's entries sorted by file name.
    /// `.down` companions are rollback inputs and are excluded here.
    pub fn migrations(&self) -> Vec<PathBuf> {
        self.expand_paths(&self.extra().migrations)
            .into_iter()
            .filter(|file| {
                file.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(|stem| !stem.ends_with(".down"))
                    .unwrap_or(true)
            })
            .collect()
    }

    /// Seed files, expanded like migrations.
    pub fn seeders(&self) -> Vec<PathBuf> {
        self.expand_paths(&self.extra().seeders)
    }

    /// Unseed files, expanded like migrations.
    pub fn unseeders(&self) -> Vec<PathBuf> {
        self.expand_paths(&self.extra().unseeders)
    }

    /// Declared asset map: source subpath to destination path relative to the
    /// application root.
    pub fn assets(&self) -> BTreeMap<String, String> {
        self.extra().assets
    }

    fn expand_paths(&self, declared: &[String]) -> Vec<PathBuf> {
        let root = self.path();
        let mut files = Vec::new();
        for entry in declared {
            let path = root.join(entry);
            if path.is_dir() {
                let mut children: Vec<PathBuf> = match std::fs::read_dir(&path) {
                    Ok(read) => read
                        .filter_map(|e| e.ok())
                        .map(|e| e.path())
                        .filter(|p| p.is_file())
                        .collect(),
                    Err(_) => Vec::new(),
                };
                children.sort();
                files.extend(children);
            } else if path.is_file() {
                files.push(path);
            }
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str, description: Option<&str>) -> PackageDescriptor {
        PackageDescriptor {
            name: Some(name.to_string()),
            description: description.map(|d| d.to_string()),
            extra: ExtraSection::default(),
        }
    }

    #[test]
    fn merge_starts_from_package_name() {
        let record = merge_record(None, None, Some(&package("demo-hook", None)));
        assert_eq!(record.name, "demo-hook");
        assert_eq!(record.description, "This is a hook.");
        assert!(!record.enabled);
        assert!(!record.installed);
        assert!(record.version.is_none());
    }

    #[test]
    fn descriptor_description_wins_over_manifest_and_package() {
        let mut manifest = HookRecord::new("demo-hook");
        manifest.description = "manifest text".to_string();
        let descriptor = HookDescriptor {
            description: Some("descriptor text".to_string()),
            ..Default::default()
        };
        let record = merge_record(
            Some(&manifest),
            Some(&descriptor),
            Some(&package("demo-hook", Some("package text"))),
        );
        assert_eq!(record.description, "descriptor text");
    }

    #[test]
    fn package_description_only_fills_the_default() {
        let mut manifest = HookRecord::new("demo-hook");
        manifest.description = "kept".to_string();
        let record = merge_record(
            Some(&manifest),
            None,
            Some(&package("demo-hook", Some("ignored"))),
        );
        assert_eq!(record.description, "kept");

        let record = merge_record(
            Some(&HookRecord::new("demo-hook")),
            None,
            Some(&package("demo-hook", Some("used"))),
        );
        assert_eq!(record.description, "used");
    }

    #[test]
    fn silent_descriptor_does_not_flip_enabled() {
        let mut manifest = HookRecord::new("demo-hook");
        manifest.enabled = true;
        let record = merge_record(Some(&manifest), Some(&HookDescriptor::default()), None);
        assert!(record.enabled);

        let descriptor = HookDescriptor {
            enabled: Some(false),
            ..Default::default()
        };
        let record = merge_record(Some(&manifest), Some(&descriptor), None);
        assert!(!record.enabled);
    }

    #[test]
    fn record_round_trips_through_json() {
        let mut record = HookRecord::new("vendor/demo");
        record.version = Some("v1.2.0".to_string());
        record.kind = Some(HookKind::Composer);
        record.enabled = true;
        record.installed = true;

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"type\":\"composer\""));
        let parsed: HookRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn derived_attributes_read_package_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let config = HooksConfig::new(dir.path());
        let hook_dir = config.local_hook_dir("demo-hook");
        std::fs::create_dir_all(hook_dir.join("db")).unwrap();
        std::fs::write(hook_dir.join("db/002_b.sql"), "b").unwrap();
        std::fs::write(hook_dir.join("db/001_a.sql"), "a").unwrap();
        std::fs::write(hook_dir.join("db/001_a.down.sql"), "undo a").unwrap();
        std::fs::write(
            hook_dir.join("composer.json"),
            serde_json::json!({
                "name": "demo-hook",
                "extra": {"hook": {
                    "providers": ["DemoProvider"],
                    "migrations": ["db"],
                }}
            })
            .to_string(),
        )
        .unwrap();

        let hook = Hook::new(HookRecord::new("demo-hook"), &config);
        assert!(hook.is_local());
        assert_eq!(hook.providers(), vec!["DemoProvider".to_string()]);
        let migrations = hook.migrations();
        assert_eq!(migrations.len(), 2, "down companions are not migrations");
        assert!(migrations[0].ends_with("001_a.sql"));
        assert!(migrations[1].ends_with("002_b.sql"));
    }
}
