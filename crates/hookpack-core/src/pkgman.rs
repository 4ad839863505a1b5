//! Dependency-manager integration
//!
//! The orchestrator consumes the dependency manager through the
//! [`PackageManager`] trait: resolve-and-fetch (`require`), removal and the
//! "outdated" report. The shipping [`CommandPackageManager`] shells out to a
//! configured binary and captures its output; a non-zero exit propagates as
//! [`HookError::DependencyOperationFailed`] with that output attached.
//!
//! [`ProjectPackageFile`] edits the project's own package file, which is how
//! local hooks become resolvable: install registers a `path` repository
//! pointing at `hooks/<name>` before requiring it.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HookError, Result};

/// One entry of the dependency manager's outdated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutdatedPackage {
    pub name: String,
    pub version: String,
    pub latest: String,
}

/// Structured `outdated` output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutdatedReport {
    #[serde(default)]
    pub installed: Vec<OutdatedPackage>,
}

/// External dependency-manager operations the orchestrator relies on.
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Resolve and fetch the given package specs (`name` or `name:version`).
    async fn require(&self, packages: &[String]) -> Result<String>;

    /// Remove the given packages.
    async fn remove(&self, packages: &[String]) -> Result<String>;

    /// Report installed packages with a newer version available.
    async fn list_outdated(&self) -> Result<OutdatedReport>;
}

/// Subprocess-backed [`PackageManager`].
#[derive(Debug, Clone)]
pub struct CommandPackageManager {
    bin: String,
    working_dir: PathBuf,
}

impl CommandPackageManager {
    pub fn new(bin: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            working_dir: working_dir.into(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        debug!(bin = %self.bin, ?args, "running package manager");
        let output = tokio::process::Command::new(&self.bin)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .output()
            .await?;

        let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
        captured.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(HookError::dependency(captured));
        }
        Ok(captured)
    }
}

#[async_trait]
impl PackageManager for CommandPackageManager {
    async fn require(&self, packages: &[String]) -> Result<String> {
        let mut args = vec!["require"];
        args.extend(packages.iter().map(|p| p.as_str()));
        self.run(&args).await
    }

    async fn remove(&self, packages: &[String]) -> Result<String> {
        let mut args = vec!["remove"];
        args.extend(packages.iter().map(|p| p.as_str()));
        self.run(&args).await
    }

    async fn list_outdated(&self) -> Result<OutdatedReport> {
        let output = self.run(&["outdated", "--format=json"]).await?;
        Ok(serde_json::from_str(&output)?)
    }
}

/// Editor for the project package file.
///
/// The document is kept as a raw JSON value so unrelated keys written by the
/// dependency manager survive a load/edit/save cycle untouched.
#[derive(Debug)]
pub struct ProjectPackageFile {
    path: PathBuf,
    document: serde_json::Value,
}

impl ProjectPackageFile {
    /// Load the package file, starting from an empty object if absent.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = if path.is_file() {
            serde_json::from_str(&std::fs::read_to_string(&path)?)?
        } else {
            serde_json::json!({})
        };
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register (or replace) a named repository entry.
    pub fn add_repository(&mut self, name: &str, kind: &str, url: &str) -> &mut Self {
        if !self.document.is_object() {
            self.document = serde_json::json!({});
        }
        if let Some(root) = self.document.as_object_mut() {
            let repositories = root
                .entry("repositories")
                .or_insert_with(|| serde_json::json!({}));
            repositories[name] = serde_json::json!({ "type": kind, "url": url });
        }
        self
    }

    /// Set one key under the `config` table.
    pub fn add_config(&mut self, key: &str, value: serde_json::Value) -> &mut Self {
        if !self.document.is_object() {
            self.document = serde_json::json!({});
        }
        if let Some(root) = self.document.as_object_mut() {
            let config = root
                .entry("config")
                .or_insert_with(|| serde_json::json!({}));
            config[key] = value;
        }
        self
    }

    /// Serialize and replace the file in one write.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.document)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_repository_preserves_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("composer.json");
        std::fs::write(&path, r#"{"name": "acme/app", "require": {"acme/kernel": "^2.0"}}"#)
            .unwrap();

        let mut package = ProjectPackageFile::load(&path).unwrap();
        package
            .add_repository("demo-hook", "path", "hooks/demo-hook")
            .save()
            .unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["name"], "acme/app");
        assert_eq!(saved["require"]["acme/kernel"], "^2.0");
        assert_eq!(saved["repositories"]["demo-hook"]["type"], "path");
        assert_eq!(saved["repositories"]["demo-hook"]["url"], "hooks/demo-hook");
    }

    #[test]
    fn add_config_writes_under_the_config_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("composer.json");
        std::fs::write(&path, r#"{"name": "acme/app", "config": {"sort-packages": true}}"#)
            .unwrap();

        let mut package = ProjectPackageFile::load(&path).unwrap();
        package
            .add_config("secure-http", serde_json::json!(false))
            .save()
            .unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["config"]["secure-http"], false);
        assert_eq!(saved["config"]["sort-packages"], true);
    }

    #[test]
    fn load_tolerates_a_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("composer.json");
        let mut package = ProjectPackageFile::load(&path).unwrap();
        package.add_repository("a", "path", "hooks/a").save().unwrap();
        assert!(path.is_file());
    }

    #[tokio::test]
    async fn failing_subprocess_carries_its_output() {
        let dir = tempfile::tempdir().unwrap();
        let manager = CommandPackageManager::new("sh", dir.path());
        // `sh require ...` fails because no script named `require` exists.
        let err = manager
            .require(&["vendor/demo".to_string()])
            .await
            .unwrap_err();
        match err {
            HookError::DependencyOperationFailed { output } => assert!(!output.is_empty()),
            other => panic!("expected dependency failure, got {other:?}"),
        }
    }

    #[test]
    fn outdated_report_parses_manager_output() {
        let raw = r#"{"installed": [
            {"name": "vendor/demo", "version": "v1.0.0", "latest": "v1.2.0"},
            {"name": "acme/kernel", "version": "2.1.0", "latest": "2.2.0"}
        ]}"#;
        let report: OutdatedReport = serde_json::from_str(raw).unwrap();
        assert_eq!(report.installed.len(), 2);
        assert_eq!(report.installed[0].latest, "v1.2.0");
    }
}
