//! Hookpack CLI
//!
//! Thin command-line front end over `hookpack_core`: argument parsing,
//! output formatting and exit-code handling. All lifecycle behavior lives
//! in the core crate.

pub mod error;
pub mod output;
pub mod router;

pub use error::{CliError, CliResult};
pub use router::{Cli, Commands};
