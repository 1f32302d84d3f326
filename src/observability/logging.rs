//! Logging configuration resolved from config settings and the environment.

use crate::config::LoggingSettings;
use std::path::PathBuf;

/// Output format environment variable.
pub const LOG_FORMAT_ENV: &str = "WATCHBOT_LOG_FORMAT";
/// Filter directive environment variable, consulted after `RUST_LOG`.
pub const LOG_LEVEL_ENV: &str = "WATCHBOT_LOG_LEVEL";
/// Log file environment variable.
pub const LOG_FILE_ENV: &str = "WATCHBOT_LOG_FILE";

const DEFAULT_FILTER: &str = "info";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive.
    pub filter: String,
    /// Log file; stderr when `None`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_FILTER.to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Resolves logging from config settings and process environment.
    #[must_use]
    pub fn from_settings(settings: &LoggingSettings, verbose: bool) -> Self {
        Self::resolve(settings, verbose, |key| std::env::var(key).ok())
    }

    /// Resolves logging using `env` to look up variables.
    ///
    /// Precedence for the filter: `verbose`, `RUST_LOG`, `WATCHBOT_LOG_LEVEL`,
    /// the config file, then `info`. Format and file take the environment
    /// over the config file.
    #[must_use]
    pub fn resolve(
        settings: &LoggingSettings,
        verbose: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let format = non_empty(LOG_FORMAT_ENV)
            .or_else(|| settings.format.clone())
            .and_then(|f| LogFormat::parse(&f))
            .unwrap_or_default();

        let filter = if verbose {
            "debug".to_string()
        } else {
            non_empty("RUST_LOG")
                .or_else(|| non_empty(LOG_LEVEL_ENV))
                .or_else(|| settings.level.clone())
                .unwrap_or_else(|| DEFAULT_FILTER.to_string())
        };

        let file = non_empty(LOG_FILE_ENV)
            .map(PathBuf::from)
            .or_else(|| settings.file.clone());

        Self {
            format,
            filter,
            file,
        }
    }
}
