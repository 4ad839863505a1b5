//! The hook lifecycle orchestrator
//!
//! [`HookManager`] owns the authoritative hook set and drives every
//! transition of the per-hook state machine:
//!
//! ```text
//! Unknown -> Downloaded (not installed) -> Installed (disabled) -> Enabled
//! ```
//!
//! Each operation validates its preconditions, delegates to the collaborators
//! (package manager, migration runner, seed runner, asset publisher), and
//! persists the manifest by rewriting it wholesale. Operations are not
//! atomic: a failure between the dependency fetch and the final persist
//! leaves reality ahead of the manifest, and the next invocation's discovery
//! pass reconciles it. Events bracket every mutating phase so hosts can react
//! without the orchestrator knowing about them.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{Local, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::HooksConfig;
use crate::discovery;
use crate::error::{HookError, Result};
use crate::events::{EventBus, HookEvent};
use crate::hook::{Hook, HookKind, HookRecord};
use crate::manifest::{ManifestDocument, ManifestStore};
use crate::pkgman::{CommandPackageManager, PackageManager, ProjectPackageFile};
use crate::publisher::{copy_dir_recursive, AssetPublisher};
use crate::registry::RegistryClient;
use crate::runner::{run_scripts, MigrationRunner, SeedRunner, ShellRunner};
use crate::scaffold;
use crate::updates::OutdatedCache;

/// Phase flags for `install`.
#[derive(Debug, Clone, Copy)]
pub struct InstallOptions {
    pub migrate: bool,
    pub seed: bool,
    pub publish: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            migrate: true,
            seed: true,
            publish: true,
        }
    }
}

/// Phase flags for `update`.
#[derive(Debug, Clone, Copy)]
pub struct UpdateOptions {
    pub migrate: bool,
    pub seed: bool,
    pub publish: bool,
    /// Skip the backup snapshot and overwrite deployed assets.
    pub force: bool,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            migrate: true,
            seed: true,
            publish: true,
            force: false,
        }
    }
}

/// Phase flags for `uninstall`.
#[derive(Debug, Clone, Copy)]
pub struct UninstallOptions {
    /// Also delete the on-disk directory (local hooks only).
    pub delete: bool,
    pub unmigrate: bool,
    pub unseed: bool,
    pub unpublish: bool,
}

impl Default for UninstallOptions {
    fn default() -> Self {
        Self {
            delete: false,
            unmigrate: true,
            unseed: true,
            unpublish: true,
        }
    }
}

/// Orchestrates the hook lifecycle against one application root.
pub struct HookManager {
    config: HooksConfig,
    store: ManifestStore,
    hooks: BTreeMap<String, HookRecord>,
    last_remote_check: Option<i64>,
    outdated: OutdatedCache,
    package_manager: Box<dyn PackageManager>,
    registry: RegistryClient,
    migrator: Box<dyn MigrationRunner>,
    seeder: Box<dyn SeedRunner>,
    publisher: AssetPublisher,
    events: EventBus,
}

impl HookManager {
    /// Build a manager with the shipping collaborators: a subprocess package
    /// manager and file-executing runners.
    pub fn new(config: HooksConfig) -> Result<Self> {
        let package_manager = Box::new(CommandPackageManager::new(
            &config.package_manager_bin,
            &config.base_path,
        ));
        let migrator = Box::new(ShellRunner::new(&config.runner_interpreter));
        let seeder = Box::new(ShellRunner::new(&config.runner_interpreter));
        Self::with_collaborators(config, package_manager, migrator, seeder)
    }

    /// Build a manager with injected collaborators. Hosts embedding the
    /// orchestrator (and tests) use this to supply their own runners.
    pub fn with_collaborators(
        config: HooksConfig,
        package_manager: Box<dyn PackageManager>,
        migrator: Box<dyn MigrationRunner>,
        seeder: Box<dyn SeedRunner>,
    ) -> Result<Self> {
        std::fs::create_dir_all(config.hooks_dir())?;
        let store = ManifestStore::new(config.manifest_file());
        let document = store.load()?;
        let last_remote_check = document.last_remote_check;
        let hooks = discovery::discover(&config, &document, None)?;
        let outdated = OutdatedCache::load(config.outdated_file());
        let registry = RegistryClient::new(config.remote_url.clone());
        let publisher = AssetPublisher::new(config.base_path.clone());

        Ok(Self {
            store,
            hooks,
            last_remote_check,
            outdated,
            package_manager,
            registry,
            migrator,
            seeder,
            publisher,
            events: EventBus::new(),
            config,
        })
    }

    pub fn config(&self) -> &HooksConfig {
        &self.config
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<HookEvent> {
        self.events.subscribe()
    }

    //------------------------------------------------------------- queries

    /// All hooks in the active set.
    pub fn hooks(&self) -> Vec<Hook> {
        self.hooks
            .values()
            .map(|record| Hook::new(record.clone(), &self.config))
            .collect()
    }

    /// The raw records, keyed by name.
    pub fn records(&self) -> &BTreeMap<String, HookRecord> {
        &self.hooks
    }

    /// Hooks whose providers the host should currently register.
    pub fn enabled_hooks(&self) -> Vec<Hook> {
        self.hooks
            .values()
            .filter(|record| record.enabled)
            .map(|record| Hook::new(record.clone(), &self.config))
            .collect()
    }

    /// Get one installed hook.
    pub fn hook(&self, name: &str) -> Result<Hook> {
        if !self.downloaded(name) {
            return Err(HookError::NotFound(name.to_string()));
        }
        let record = self
            .hooks
            .get(name)
            .filter(|record| record.installed)
            .ok_or_else(|| HookError::NotInstalled(name.to_string()))?;
        Ok(Hook::new(record.clone(), &self.config))
    }

    pub fn installed(&self, name: &str) -> bool {
        self.hooks.get(name).map(|r| r.installed).unwrap_or(false)
    }

    pub fn enabled(&self, name: &str) -> bool {
        self.hooks.get(name).map(|r| r.enabled).unwrap_or(false)
    }

    pub fn disabled(&self, name: &str) -> bool {
        !self.enabled(name)
    }

    /// Whether the hook lives under the local `hooks/` directory.
    pub fn local(&self, name: &str) -> bool {
        self.config.local_hook_dir(name).is_dir()
    }

    /// Whether any directory for the hook exists, local or vendored.
    pub fn downloaded(&self, name: &str) -> bool {
        self.config.local_hook_dir(name).is_dir() || self.config.vendor_hook_dir(name).is_dir()
    }

    pub fn version(&self, name: &str) -> Result<Option<String>> {
        Ok(self.hook(name)?.record().version.clone())
    }

    pub fn kind(&self, name: &str) -> Option<HookKind> {
        self.hooks.get(name).and_then(|r| r.kind)
    }

    /// Epoch seconds of the last explicit update check.
    pub fn last_remote_check(&self) -> Option<i64> {
        self.last_remote_check
    }

    /// Latest known version from the outdated side-cache. Only refreshed by
    /// [`check_for_updates`](Self::check_for_updates); may be stale.
    pub fn outdated(&self, name: &str) -> Option<&str> {
        self.outdated.latest(name)
    }

    //---------------------------------------------------------- operations

    /// Install a hook by name, local or remote.
    pub async fn install(
        &mut self,
        name: &str,
        version: Option<&str>,
        options: InstallOptions,
    ) -> Result<()> {
        if self.installed(name) {
            return Err(HookError::AlreadyInstalled(name.to_string()));
        }

        self.events.emit(HookEvent::Installing {
            name: name.to_string(),
        });

        let mut version = version.map(str::to_string);
        let mut remote_kind = None;

        if self.local(name) {
            // A local hook resolves through a path repository in the project
            // package file, pinned to the local version constraint.
            let mut project = ProjectPackageFile::load(self.config.project_package_file())?;
            project
                .add_repository(name, "path", &format!("hooks/{name}"))
                .save()?;
            if version.is_none() {
                version = Some(self.config.local_version.clone());
            }
        } else {
            let remote = self.registry.hook_details(name).await?;
            remote_kind = remote.kind.or(Some(HookKind::Composer));
            self.registry.notify_download(name).await;
        }

        let spec = match &version {
            Some(v) => format!("{name}:{v}"),
            None => name.to_string(),
        };
        self.package_manager.require(&[spec]).await?;

        // Re-scan reality so the fresh package shows up, then mark it.
        self.refresh(Some(name))?;
        let record = self
            .hooks
            .get_mut(name)
            .ok_or_else(|| HookError::NotFound(name.to_string()))?;
        record.installed = true;
        if record.kind.is_none() {
            record.kind = remote_kind;
        }
        let record = record.clone();

        let hook = Hook::new(record.clone(), &self.config);
        if let Some(commands) = record.scripts.get("install") {
            run_scripts(commands, &hook.path()).await?;
        }
        if options.migrate {
            self.migrator.run(&hook.migrations()).await?;
        }
        if options.seed {
            for file in hook.seeders() {
                self.seeder.run_seeder(&file).await?;
            }
        }
        if options.publish {
            self.publisher.publish(&hook, None, false)?;
        }

        self.remake_json()?;
        info!(name = %name, "hook installed");
        self.events.emit(HookEvent::Installed {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Uninstall a hook, reversing install's side effects where requested.
    pub async fn uninstall(&mut self, name: &str, options: UninstallOptions) -> Result<()> {
        if !self.installed(name) {
            return Err(HookError::NotInstalled(name.to_string()));
        }
        let hook = self.hook(name)?;

        self.events.emit(HookEvent::Uninstalling {
            name: name.to_string(),
        });

        // An enabled hook is conceptually disabled first; at this layer that
        // is the event pair only, so provider loaders can unhook.
        if self.enabled(name) {
            self.events.emit(HookEvent::Disabling {
                name: name.to_string(),
            });
            self.events.emit(HookEvent::Disabled {
                name: name.to_string(),
            });
        }

        if let Some(commands) = hook.record().scripts.get("uninstall") {
            run_scripts(commands, &hook.path()).await?;
        }
        if options.unseed {
            for file in hook.unseeders() {
                self.seeder.run_seeder(&file).await?;
            }
        }
        if options.unmigrate {
            self.migrator.rollback(&hook.migrations()).await?;
        }
        if options.unpublish {
            self.publisher.unpublish(&hook)?;
        }

        let is_local = self.local(name);
        if !is_local {
            self.package_manager.remove(&[name.to_string()]).await?;
        }

        self.hooks.remove(name);
        self.remake_json()?;
        info!(name = %name, "hook uninstalled");
        self.events.emit(HookEvent::Uninstalled {
            name: name.to_string(),
        });

        // Manifest removal is unconditional; directory deletion is opt-in
        // and only ever touches local hooks.
        if options.delete && is_local {
            std::fs::remove_dir_all(self.config.local_hook_dir(name))?;
        }
        Ok(())
    }

    /// Update a hook. Returns `Ok(false)` when the requested version is the
    /// one already installed (a no-op, not an error).
    pub async fn update(
        &mut self,
        name: &str,
        version: Option<&str>,
        options: UpdateOptions,
    ) -> Result<bool> {
        if !self.downloaded(name) {
            return Err(HookError::NotFound(name.to_string()));
        }
        if !self.installed(name) {
            return Err(HookError::NotInstalled(name.to_string()));
        }

        let current = self.hooks.get(name).and_then(|r| r.version.clone());
        if let Some(requested) = version {
            if current.as_deref() == Some(requested) {
                debug!(name = %name, version = %requested, "already on requested version");
                return Ok(false);
            }
        }

        self.events.emit(HookEvent::Updating {
            name: name.to_string(),
        });

        // Snapshot the hook directory so the publisher can tell operator
        // edits from upstream changes. `force` skips the diff entirely.
        let backup = if options.force {
            None
        } else {
            let snapshot = tempfile::tempdir()?;
            copy_dir_recursive(&self.hook(name)?.path(), snapshot.path())?;
            Some(snapshot)
        };

        let result = self
            .update_phases(name, version, options, backup.as_ref().map(|b| b.path().to_path_buf()))
            .await;

        // Cleanup runs on success and failure; a cleanup error must not mask
        // the operation's own result.
        if let Some(snapshot) = backup {
            if let Err(err) = snapshot.close() {
                warn!(error = %err, "failed to remove update backup");
            }
        }
        result
    }

    async fn update_phases(
        &mut self,
        name: &str,
        version: Option<&str>,
        options: UpdateOptions,
        backup: Option<PathBuf>,
    ) -> Result<bool> {
        let mut version = version.map(str::to_string);
        if version.is_none() {
            if self.config.use_version_wildcard_on_update {
                version = Some(self.config.version_wildcard.clone());
            }
            if self.local(name) {
                version = Some(self.config.local_version.clone());
            }
        }

        let spec = match &version {
            Some(v) => format!("{name}:{v}"),
            None => name.to_string(),
        };
        self.package_manager.require(&[spec]).await?;
        self.refresh(None)?;

        let record = self
            .hooks
            .get(name)
            .cloned()
            .ok_or_else(|| HookError::NotFound(name.to_string()))?;
        let hook = Hook::new(record.clone(), &self.config);

        if let Some(commands) = record.scripts.get("update") {
            run_scripts(commands, &hook.path()).await?;
        }
        // Migrations are re-applied forward-only; publish runs last so the
        // asset diff sees the final file state.
        if options.migrate {
            self.migrator.run(&hook.migrations()).await?;
        }
        if options.seed {
            for file in hook.seeders() {
                self.seeder.run_seeder(&file).await?;
            }
        }
        if options.publish {
            self.publisher
                .publish(&hook, backup.as_deref(), options.force)?;
        }

        self.remake_json()?;
        info!(name = %name, "hook updated");
        self.events.emit(HookEvent::Updated {
            name: name.to_string(),
        });
        Ok(true)
    }

    /// Enable an installed hook.
    pub async fn enable(&mut self, name: &str) -> Result<()> {
        if !self.downloaded(name) {
            return Err(HookError::NotFound(name.to_string()));
        }
        if !self.installed(name) {
            return Err(HookError::NotInstalled(name.to_string()));
        }
        if self.enabled(name) {
            return Err(HookError::AlreadyEnabled(name.to_string()));
        }
        let hook = self.hook(name)?;

        self.events.emit(HookEvent::Enabling {
            name: name.to_string(),
        });
        if let Some(commands) = hook.record().scripts.get("enable") {
            run_scripts(commands, &hook.path()).await?;
        }
        if let Some(record) = self.hooks.get_mut(name) {
            record.enabled = true;
        }
        self.remake_json()?;
        self.events.emit(HookEvent::Enabled {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Disable an enabled hook.
    pub async fn disable(&mut self, name: &str) -> Result<()> {
        if !self.downloaded(name) {
            return Err(HookError::NotFound(name.to_string()));
        }
        if !self.installed(name) {
            return Err(HookError::NotInstalled(name.to_string()));
        }
        if !self.enabled(name) {
            return Err(HookError::NotEnabled(name.to_string()));
        }
        let hook = self.hook(name)?;

        self.events.emit(HookEvent::Disabling {
            name: name.to_string(),
        });
        if let Some(commands) = hook.record().scripts.get("disable") {
            run_scripts(commands, &hook.path()).await?;
        }
        if let Some(record) = self.hooks.get_mut(name) {
            record.enabled = false;
        }
        self.remake_json()?;
        self.events.emit(HookEvent::Disabled {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Scaffold a new local hook from the stub templates.
    pub fn make(&mut self, name: &str) -> Result<()> {
        if self.downloaded(name) {
            return Err(HookError::AlreadyExists(name.to_string()));
        }
        self.events.emit(HookEvent::Making {
            name: name.to_string(),
        });
        let timestamp = Local::now().format("%Y_%m_%d_%H%M%S").to_string();
        scaffold::make_hook(&self.config, name, &timestamp)?;
        info!(name = %name, "hook scaffolded");
        self.events.emit(HookEvent::Made {
            name: name.to_string(),
        });
        Ok(())
    }

    /// Register the remote registry as a package repository in the project
    /// package file so remote hooks resolve through it. A plain-http
    /// registry url also needs the secure transport requirement relaxed.
    pub fn setup(&mut self) -> Result<()> {
        let mut project = ProjectPackageFile::load(self.config.project_package_file())?;
        project.add_repository("hooks", "composer", &self.config.remote_url);
        if self.config.remote_url.starts_with("http://") {
            project.add_config("secure-http", serde_json::json!(false));
        }
        project.save()?;
        info!(url = %self.config.remote_url, "registry repository registered");
        self.events.emit(HookEvent::Setup);
        Ok(())
    }

    /// Query the dependency manager's outdated view once, persist the result
    /// and return the hooks with a newer version available.
    ///
    /// `subset` restricts the check to the given names; `None` checks all.
    pub async fn check_for_updates(&mut self, subset: Option<&[String]>) -> Result<Vec<Hook>> {
        let report = self.package_manager.list_outdated().await?;

        let mut entries = BTreeMap::new();
        let mut outdated_hooks = Vec::new();
        for package in report.installed {
            if !self.hooks.contains_key(&package.name) {
                continue;
            }
            if let Some(subset) = subset {
                if !subset.iter().any(|n| n == &package.name) {
                    continue;
                }
            }
            entries.insert(package.name.clone(), package.latest.clone());
            let record = &self.hooks[&package.name];
            if record.version.as_deref() != Some(package.latest.as_str()) {
                outdated_hooks.push(Hook::new(record.clone(), &self.config));
            }
        }

        // A subset check must not wipe what earlier checks recorded for the
        // hooks outside it.
        if subset.is_some() {
            self.outdated.merge(entries)?;
        } else {
            self.outdated.store(entries)?;
        }
        self.last_remote_check = Some(Utc::now().timestamp());
        self.remake_json()?;

        let names = outdated_hooks
            .iter()
            .map(|hook| hook.name().to_string())
            .collect();
        self.events.emit(HookEvent::UpdatesAvailable { names });
        Ok(outdated_hooks)
    }

    //------------------------------------------------------------ plumbing

    /// Re-run discovery against current disk state.
    fn refresh(&mut self, just_installed: Option<&str>) -> Result<()> {
        let document = ManifestDocument {
            last_remote_check: self.last_remote_check,
            hooks: self.hooks.clone(),
        };
        self.hooks = discovery::discover(&self.config, &document, just_installed)?;
        Ok(())
    }

    /// Rewrite the whole manifest from the in-memory state.
    fn remake_json(&self) -> Result<()> {
        self.store.save(&ManifestDocument {
            last_remote_check: self.last_remote_check,
            hooks: self.hooks.clone(),
        })
    }
}
