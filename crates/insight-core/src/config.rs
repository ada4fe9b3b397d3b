//! User configuration
//!
//! Settings live in `<config_dir>/sqlite-insight/config.toml`. Every field is
//! optional; a missing file means all defaults.

use crate::{InsightError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const JOURNAL_MODES: &[&str] = &["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"];

/// How result grids are written by the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Logging settings for the front end
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Also write JSON logs to a daily rolling file
    pub file_logs: bool,
    /// Filter directive used when `RUST_LOG` is not set
    pub filter: Option<String>,
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Table created in a new database file when none is named
    pub default_table_name: String,
    /// Issue `PRAGMA foreign_keys = ON` on every connection
    pub foreign_keys: bool,
    /// Journal mode to set on every connection; left untouched when unset
    pub journal_mode: Option<String>,
    pub output_format: OutputFormat,
    pub logging: LoggingSettings,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            default_table_name: "test_table_name".to_string(),
            foreign_keys: true,
            journal_mode: None,
            output_format: OutputFormat::Table,
            logging: LoggingSettings::default(),
        }
    }
}

impl InsightConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// tried and a missing file falls back to defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match config_file() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    tracing::debug!("no config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Read and validate a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading config file");
        let text = std::fs::read_to_string(path).map_err(|e| {
            InsightError::Configuration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| InsightError::Configuration(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.default_table_name.trim().is_empty() {
            return Err(InsightError::Configuration(
                "default_table_name must not be empty".into(),
            ));
        }

        if let Some(mode) = &self.journal_mode
            && !JOURNAL_MODES.contains(&mode.to_uppercase().as_str())
        {
            return Err(InsightError::Configuration(format!(
                "Unknown journal_mode '{}', expected one of {}",
                mode,
                JOURNAL_MODES.join(", ")
            )));
        }

        Ok(())
    }
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("sqlite-insight"))
}

pub fn config_file() -> Option<PathBuf> {
    config_dir().map(|p| p.join("config.toml"))
}

/// Directory for rolling log files
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sqlite-insight")
        .join("logs")
}
