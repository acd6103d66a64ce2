//! Compiler configuration.
//!
//! Quoted literals are reinterpreted as date/times using an explicit list of
//! formats rather than locale conventions. The configuration can be loaded
//! from TOML:
//!
//! ```toml
//! date_formats = ["%Y-%m-%d", "%Y/%m/%d"]
//! datetime_formats = ["%Y-%m-%d %H:%M:%S"]
//! default_offset = "+02:00"
//! max_query_length = 1024
//! max_depth = 32
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default bound on query length, in bytes.
pub const DEFAULT_MAX_QUERY_LENGTH: usize = 4096;

/// Default bound on parenthesis nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Errors that can occur while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// The path that was read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has the wrong shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The default offset is not of the form `Z`, `+HH:MM` or `-HH:MM`.
    #[error("invalid default offset: {0} (expected Z, +HH:MM or -HH:MM)")]
    InvalidOffset(String),
}

/// Settings that control literal interpretation and input bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// `chrono` formats for date-only literals, tried in order.
    pub date_formats: Vec<String>,

    /// `chrono` formats for date-and-time literals without an offset, tried in order.
    /// RFC 3339 literals are always accepted first.
    pub datetime_formats: Vec<String>,

    /// Offset applied to literals that carry none.
    pub default_offset: String,

    /// Longest accepted query, in bytes. `None` disables the check.
    pub max_query_length: Option<usize>,

    /// Deepest accepted parenthesis nesting. Unlike the length bound this
    /// one cannot be disabled, since every parser pass recurses per level.
    pub max_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            date_formats: vec!["%Y-%m-%d".to_string(), "%Y/%m/%d".to_string()],
            datetime_formats: vec![
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%Y-%m-%d %H:%M".to_string(),
                "%Y/%m/%d %H:%M:%S".to_string(),
            ],
            default_offset: "+00:00".to_string(),
            max_query_length: Some(DEFAULT_MAX_QUERY_LENGTH),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CompilerConfig {
    /// Parses a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CompilerConfig = toml::from_str(content)?;
        config.offset()?;
        Ok(config)
    }

    /// Loads a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns the parsed default offset.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        parse_offset(&self.default_offset)
            .ok_or_else(|| ConfigError::InvalidOffset(self.default_offset.clone()))
    }

    /// Reinterprets a literal as a date/time instant.
    ///
    /// Tries RFC 3339, then each date-time format, then each date format
    /// (at midnight). Returns `None` if nothing matches.
    pub fn parse_datetime(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        let text = text.trim();
        if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
            return Some(datetime);
        }

        let offset = self.offset().ok()?;
        let naive = self
            .datetime_formats
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
            .or_else(|| {
                self.date_formats
                    .iter()
                    .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })?;

        offset.from_local_datetime(&naive).single()
    }
}

/// Parses `Z`, `+HH:MM`, `-HH:MM` or `+HHMM`.
fn parse_offset(text: &str) -> Option<FixedOffset> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
