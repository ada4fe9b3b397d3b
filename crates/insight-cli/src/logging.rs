//! Logging setup for the command-line front end
//!
//! Console output goes to stderr so it never mixes with result grids on
//! stdout. `RUST_LOG` takes precedence over the configured filter. JSON file
//! logs are opt-in and roll daily.

use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Directory where log files should be written
    pub log_dir: PathBuf,

    /// Whether to enable JSON output to files
    pub enable_json_logs: bool,

    /// Default log level filter
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: insight_core::log_dir(),
            enable_json_logs: false,
            default_filter: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Build from the user settings and the number of `-v` flags
    pub fn from_settings(settings: &insight_core::LoggingSettings, verbosity: u8) -> Self {
        let default_filter = match verbosity {
            0 => settings
                .filter
                .clone()
                .unwrap_or_else(|| "warn".to_string()),
            1 => "info,insight_sqlite=debug".to_string(),
            _ => "debug".to_string(),
        };

        Self {
            enable_json_logs: settings.file_logs,
            default_filter,
            ..Self::default()
        }
    }
}

/// Initialize the logging system with the given configuration
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let mut layers = Vec::new();

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter.clone())
        .boxed();
    layers.push(console_layer);

    if config.enable_json_logs {
        std::fs::create_dir_all(&config.log_dir)?;
        let file_appender = tracing_appender::rolling::daily(&config.log_dir, "sqlite-insight.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // The guard has to outlive every log call, i.e. the whole process.
        std::mem::forget(guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_writer(non_blocking)
            .with_filter(env_filter)
            .boxed();
        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::debug!(
        log_dir = %config.log_dir.display(),
        json_enabled = config.enable_json_logs,
        "logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_core::LoggingSettings;

    #[test]
    fn test_defaults_are_quiet() {
        let config = LoggingConfig::default();
        assert!(!config.enable_json_logs);
        assert_eq!(config.default_filter, "warn");
    }

    #[test]
    fn test_settings_filter_used_without_verbosity() {
        let settings = LoggingSettings {
            file_logs: true,
            filter: Some("info".into()),
        };
        let config = LoggingConfig::from_settings(&settings, 0);
        assert!(config.enable_json_logs);
        assert_eq!(config.default_filter, "info");
    }

    #[test]
    fn test_verbosity_overrides_settings_filter() {
        let settings = LoggingSettings {
            file_logs: false,
            filter: Some("error".into()),
        };
        assert_eq!(
            LoggingConfig::from_settings(&settings, 1).default_filter,
            "info,insight_sqlite=debug"
        );
        assert_eq!(LoggingConfig::from_settings(&settings, 3).default_filter, "debug");
    }
}
