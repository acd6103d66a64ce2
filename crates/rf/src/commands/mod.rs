//! Command handlers for the rf CLI.
//!
//! Each handler loads what it needs (schema, config, input), runs the
//! compiler and prints the result.

pub mod check;
pub mod config;
pub mod filter;

use recfilter::{ConfigError, FilterError};

use crate::cli::Cli;

/// Error type for command execution.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Query could not be compiled.
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No config location could be derived from the environment.
    #[error("configuration error: could not determine config directory")]
    NoConfigDir,

    /// Schema file is malformed.
    #[error("schema error: {0}")]
    Schema(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input document is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for command execution.
pub type Result<T> = std::result::Result<T, CommandError>;

/// Output settings shared by every command.
pub struct CommandContext {
    /// Print reports as JSON.
    pub json_output: bool,
    /// Color headers in human-readable reports.
    pub use_colors: bool,
    /// Suppress reports; errors and filtered records are still printed.
    pub quiet: bool,
}

impl CommandContext {
    /// Builds the context from the global flags.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            json_output: cli.json,
            use_colors: !cli.no_color,
            quiet: cli.quiet,
        }
    }
}
