//! Error types for hook lifecycle operations
//!
//! Every variant describes a precondition or state violation raised
//! synchronously to the caller; none of these are transient faults that the
//! orchestrator retries. The only swallowed failure in the whole crate is the
//! best-effort download-count notification, which is logged and dropped.

use thiserror::Error;

/// Errors that can occur while managing hooks
#[derive(Debug, Error)]
pub enum HookError {
    /// The hook is already present in the manifest as installed.
    #[error("Hook [{0}] is already installed.")]
    AlreadyInstalled(String),

    /// The hook is installed and already enabled.
    #[error("Hook [{0}] is already enabled.")]
    AlreadyEnabled(String),

    /// A directory for the hook already exists, so it cannot be scaffolded.
    #[error("Hook [{0}] already exists.")]
    AlreadyExists(String),

    /// The hook is unknown: neither a local nor a vendored directory exists.
    #[error("Hook [{0}] not found.")]
    NotFound(String),

    /// The hook is downloaded but not recorded as installed.
    #[error("Hook [{0}] not installed.")]
    NotInstalled(String),

    /// The operation requires an enabled hook.
    #[error("Hook [{0}] not enabled.")]
    NotEnabled(String),

    /// The registry answered but reports that the hook does not exist.
    #[error("Hook [{name}] does not exist on the remote registry.")]
    RemoteLookupFailed { name: String },

    /// The package-manager subprocess returned a non-zero status.
    ///
    /// The captured stdout/stderr is carried along for diagnostics; the
    /// operation is not retried.
    #[error("Dependency operation failed: {output}")]
    DependencyOperationFailed { output: String },

    /// A migration, seeder or lifecycle script exited with a failure status.
    #[error("Script [{command}] exited with status {status}")]
    ScriptFailed { command: String, status: i32 },

    /// IO error from filesystem operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error from manifest, descriptor or lock-file parsing
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error while talking to the remote registry
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl HookError {
    /// Create a dependency failure carrying the subprocess output.
    pub fn dependency<S: Into<String>>(output: S) -> Self {
        Self::DependencyOperationFailed {
            output: output.into(),
        }
    }
}

/// Result type for hook operations
pub type Result<T> = std::result::Result<T, HookError>;
