//! Migration, seed and lifecycle-script execution
//!
//! The orchestrator never interprets migration or seed files itself; it hands
//! them to a [`MigrationRunner`] / [`SeedRunner`]. Host applications embed
//! their own runners; the shipping [`ShellRunner`] executes each file with a
//! configured interpreter, and rolls a migration back by executing its
//! `<stem>.down.<ext>` companion.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{HookError, Result};

/// Applies and reverts a hook's migration files.
#[async_trait]
pub trait MigrationRunner: Send + Sync {
    /// Run the given migration files forward, in order.
    async fn run(&self, files: &[PathBuf]) -> Result<()>;

    /// Revert the given migration files, most recent first.
    async fn rollback(&self, files: &[PathBuf]) -> Result<()>;
}

/// Executes a hook's seed units.
#[async_trait]
pub trait SeedRunner: Send + Sync {
    async fn run_seeder(&self, file: &Path) -> Result<()>;
}

/// File-executing runner: `<interpreter> <file>` per unit.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    interpreter: String,
}

impl ShellRunner {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    async fn exec_file(&self, file: &Path) -> Result<()> {
        debug!(file = %file.display(), "executing");
        let status = tokio::process::Command::new(&self.interpreter)
            .arg(file)
            .status()
            .await?;
        if !status.success() {
            return Err(HookError::ScriptFailed {
                command: file.display().to_string(),
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}

/// The `<stem>.down.<ext>` companion of a migration file.
fn down_companion(file: &Path) -> PathBuf {
    let stem = file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let name = match file.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}.down.{ext}"),
        None => format!("{stem}.down"),
    };
    file.with_file_name(name)
}

#[async_trait]
impl MigrationRunner for ShellRunner {
    async fn run(&self, files: &[PathBuf]) -> Result<()> {
        for file in files {
            self.exec_file(file).await?;
        }
        Ok(())
    }

    async fn rollback(&self, files: &[PathBuf]) -> Result<()> {
        for file in files.iter().rev() {
            let down = down_companion(file);
            if down.is_file() {
                self.exec_file(&down).await?;
            } else {
                warn!(file = %file.display(), "no down companion, skipping rollback");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SeedRunner for ShellRunner {
    async fn run_seeder(&self, file: &Path) -> Result<()> {
        self.exec_file(file).await
    }
}

/// Run one lifecycle script list from the given working directory.
///
/// Commands run through `sh -c`, in declaration order; the first failure
/// aborts the remainder.
pub async fn run_scripts(commands: &[String], working_dir: &Path) -> Result<()> {
    for command in commands {
        debug!(command = %command, dir = %working_dir.display(), "running lifecycle script");
        let status = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(command)
            .current_dir(working_dir)
            .status()
            .await?;
        if !status.success() {
            return Err(HookError::ScriptFailed {
                command: command.clone(),
                status: status.code().unwrap_or(-1),
            });
        }
    }
    Ok(())
}
