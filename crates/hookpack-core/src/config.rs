//! Orchestrator configuration
//!
//! All knobs live in an explicit [`HooksConfig`] handed to the orchestrator
//! constructor. There is no process-wide mutable state: tests construct
//! multiple managers with distinct configurations side by side.

use std::path::PathBuf;

/// Default remote hook registry.
pub const DEFAULT_REMOTE: &str = "https://hookpack.io";

/// Configuration for a [`HookManager`](crate::HookManager) instance.
#[derive(Debug, Clone)]
pub struct HooksConfig {
    /// Root of the host application. Everything else resolves under it.
    pub base_path: PathBuf,

    /// Remote hook registry base URL.
    pub remote_url: String,

    /// Resolve `update` without an explicit version to the wildcard
    /// constraint instead of keeping the current constraint.
    pub use_version_wildcard_on_update: bool,

    /// Wildcard constraint passed to the package manager.
    pub version_wildcard: String,

    /// Version constraint used for locally vendored hooks.
    pub local_version: String,

    /// Binary invoked for dependency operations.
    pub package_manager_bin: String,

    /// Interpreter used by the shipping migration/seed runners.
    pub runner_interpreter: String,
}

impl HooksConfig {
    /// Create a configuration rooted at `base_path` with default settings.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            remote_url: DEFAULT_REMOTE.to_string(),
            use_version_wildcard_on_update: false,
            version_wildcard: "*".to_string(),
            local_version: "dev-master".to_string(),
            package_manager_bin: "composer".to_string(),
            runner_interpreter: "sh".to_string(),
        }
    }

    /// Directory holding local hooks, the manifest and the outdated cache.
    pub fn hooks_dir(&self) -> PathBuf {
        self.base_path.join("hooks")
    }

    /// Directory the dependency manager materializes packages into.
    pub fn vendor_dir(&self) -> PathBuf {
        self.base_path.join("vendor")
    }

    /// Path of a locally vendored hook.
    pub fn local_hook_dir(&self, name: &str) -> PathBuf {
        self.hooks_dir().join(name)
    }

    /// Path of a dependency-manager-fetched hook.
    pub fn vendor_hook_dir(&self, name: &str) -> PathBuf {
        self.vendor_dir().join(name)
    }

    /// The persisted manifest document.
    pub fn manifest_file(&self) -> PathBuf {
        self.hooks_dir().join("hooks.json")
    }

    /// Side-cache written by `check_for_updates`.
    pub fn outdated_file(&self) -> PathBuf {
        self.hooks_dir().join("outdated.json")
    }

    /// The project package file gaining local `path` repositories.
    pub fn project_package_file(&self) -> PathBuf {
        self.base_path.join("composer.json")
    }

    /// The dependency lock file scanned during discovery.
    pub fn lock_file(&self) -> PathBuf {
        self.base_path.join("composer.lock")
    }

    /// Origin marker identifying lock-file entries as hook packages.
    pub fn download_marker(&self) -> String {
        format!("{}/downloads", self.remote_url)
    }

    /// Registry endpoint serving metadata for one hook.
    pub fn registry_endpoint(&self, name: &str) -> String {
        format!("{}/api/hooks/{}.json", self.remote_url, name)
    }
}
