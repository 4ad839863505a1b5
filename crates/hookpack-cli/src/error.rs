// CLI error handling

use hookpack_core::HookError;
use thiserror::Error;

/// Errors surfaced to the terminal user.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Hook(#[from] HookError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Message shown to the user on failure.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

pub type CliResult<T> = Result<T, CliError>;
