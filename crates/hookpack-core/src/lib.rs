//! Hookpack Core
//!
//! Lifecycle management for hooks: installable add-on packages that extend a
//! host application with migrations, seed data, publishable assets and
//! runtime providers.
//!
//! # Overview
//!
//! A hook is a package directory carrying a `composer.json` with an
//! `extra.hook` section, plus an optional `hook.json` descriptor. Hooks are
//! either *local* (developed under `hooks/` in the application root) or
//! *remote* (fetched from a registry into `vendor/`). Each hook moves
//! through a small state machine:
//!
//! ```text
//! Unknown -> Downloaded -> Installed (disabled) -> Enabled
//! ```
//!
//! # Architecture
//!
//! 1. **Orchestrator** (`manager`): drives install, update, enable, disable,
//!    uninstall and make, and owns the authoritative hook set
//! 2. **Discovery** (`discovery`): reconciles the manifest with the project
//!    lock file and the directories actually on disk
//! 3. **Collaborators** (`pkgman`, `registry`, `runner`, `publisher`):
//!    dependency resolution, registry lookups, migration and seed execution,
//!    asset deployment
//! 4. **State** (`manifest`, `updates`, `hook`, `config`): the persisted
//!    manifest, the outdated side-cache, and the merged per-hook view
//!
//! # Quick Start
//!
//! ```ignore
//! use hookpack_core::{HookManager, HooksConfig, InstallOptions};
//!
//! let config = HooksConfig::new("/srv/app");
//! let mut manager = HookManager::new(config)?;
//!
//! manager.make("greeting-hook")?;
//! manager
//!     .install("greeting-hook", None, InstallOptions::default())
//!     .await?;
//! manager.enable("greeting-hook").await?;
//!
//! for hook in manager.enabled_hooks() {
//!     println!("{} provides {:?}", hook.name(), hook.providers());
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return `Result<T>`, an alias for
//! `std::result::Result<T, HookError>`. Precondition violations (installing
//! an installed hook, enabling an enabled one) are distinct variants so
//! callers can match on them.

pub mod config;
pub mod discovery;
pub mod error;
pub mod events;
pub mod hook;
pub mod manager;
pub mod manifest;
pub mod pkgman;
pub mod publisher;
pub mod registry;
pub mod runner;
pub mod scaffold;
pub mod updates;

// Re-export public types
pub use config::{HooksConfig, DEFAULT_REMOTE};
pub use error::{HookError, Result};
pub use events::{EventBus, HookEvent};
pub use hook::{Hook, HookDescriptor, HookKind, HookRecord, PackageDescriptor};
pub use manager::{HookManager, InstallOptions, UninstallOptions, UpdateOptions};
pub use manifest::{ManifestDocument, ManifestStore};
pub use pkgman::{
    CommandPackageManager, OutdatedPackage, OutdatedReport, PackageManager, ProjectPackageFile,
};
pub use publisher::AssetPublisher;
pub use registry::{RegistryClient, RemoteHook};
pub use runner::{MigrationRunner, SeedRunner, ShellRunner};
pub use updates::OutdatedCache;
