//! Config command implementation.
//!
//! Shows where the configuration lives and the settings in effect.
//! Config file is located at ~/.config/rf/config.toml.

use std::env;
use std::path::PathBuf;

use directories::BaseDirs;
use owo_colors::OwoColorize;
use recfilter::CompilerConfig;
use tracing::debug;

use super::{CommandContext, CommandError, Result};

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "RF_CONFIG";

/// Gets the config file path.
///
/// `$RF_CONFIG` wins, then `$XDG_CONFIG_HOME/rf/config.toml`, then
/// `~/.config/rf/config.toml` on all platforms.
pub fn get_config_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }

    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(xdg_config).join("rf").join("config.toml"));
    }

    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".config").join("rf").join("config.toml"))
        .ok_or(CommandError::NoConfigDir)
}

/// Loads the compiler configuration, falling back to defaults when no file exists.
pub fn load_config() -> Result<CompilerConfig> {
    let path = get_config_path()?;

    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(CompilerConfig::default());
    }

    debug!(path = %path.display(), "loading config");
    Ok(CompilerConfig::load(&path)?)
}

/// Executes the config path command.
pub fn execute_path(ctx: &CommandContext) -> Result<()> {
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", path.display());
    }

    Ok(())
}

/// Executes the config show command.
pub fn execute_show(ctx: &CommandContext) -> Result<()> {
    let config = load_config()?;
    let path = get_config_path()?;

    if ctx.json_output {
        let output = serde_json::json!({
            "path": path.display().to_string(),
            "exists": path.exists(),
            "config": config,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        let header = "Configuration";
        if ctx.use_colors {
            println!("{}\n", header.green().bold());
        } else {
            println!("{}\n", header);
        }

        println!("File: {}", path.display());
        println!("Exists: {}\n", path.exists());

        if !path.exists() {
            println!("(No config file exists. Showing defaults.)\n");
        }
        print!("{}", config.to_toml_string()?);
    }

    Ok(())
}
