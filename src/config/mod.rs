//! Configuration management.
//!
//! Configuration is read from a TOML file. Every key is optional:
//!
//! ```toml
//! data_dir = ".watchbot"
//! watch_file = ".watchbot/keyword_watches.json"
//! default_activity_timeout = 180.0
//! exhaustive_suffix_matches = false
//!
//! [logging]
//! format = "json"
//! level = "debug"
//! file = "/var/log/watchbot.log"
//! ```

use crate::models::DEFAULT_ACTIVITY_TIMEOUT_SECS;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "WATCHBOT_CONFIG_PATH";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "WATCHBOT_DATA_DIR";

const WATCH_FILE_NAME: &str = "keyword_watches.json";

/// Main configuration for watchbot.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchbotConfig {
    /// Directory for persistent data.
    pub data_dir: PathBuf,
    /// Explicit watch file; defaults to `keyword_watches.json` in `data_dir`.
    pub watch_file: Option<PathBuf>,
    /// Activity timeout given to users on first use.
    pub default_activity_timeout: f64,
    /// Report keywords that end at the same position as a longer keyword.
    pub exhaustive_suffix_matches: bool,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Logging section of the configuration.
///
/// Environment variables take precedence over these values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSettings {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// Default filter directive, such as `info` or `watchbot=debug`.
    pub level: Option<String>,
    /// Log file path. Logs go to stderr when unset.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Watch file path.
    pub watch_file: Option<String>,
    /// Default activity timeout in seconds.
    pub default_activity_timeout: Option<f64>,
    /// Exhaustive suffix matching.
    pub exhaustive_suffix_matches: Option<bool>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// Output format.
    pub format: Option<String>,
    /// Filter directive.
    pub level: Option<String>,
    /// Log file.
    pub file: Option<String>,
}

impl Default for WatchbotConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".watchbot"),
            watch_file: None,
            default_activity_timeout: DEFAULT_ACTIVITY_TIMEOUT_SECS,
            exhaustive_suffix_matches: false,
            logging: LoggingSettings::default(),
        }
    }
}

impl WatchbotConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> crate::Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| crate::Error::OperationFailed {
                operation: "read_config_file".to_string(),
                cause: format!("{}: {}", path.display(), e),
            })?;
        Self::parse(&contents)
    }

    /// Parses TOML configuration text.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid TOML or unknown keys.
    pub fn parse(contents: &str) -> crate::Result<Self> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|e| crate::Error::OperationFailed {
                operation: "parse_config_file".to_string(),
                cause: e.to_string(),
            })?;
        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Reads `watchbot/config.toml` from the platform config dir
    /// (`~/.config/watchbot/` on Linux). Returns defaults if the file is
    /// missing or unreadable.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let platform_config = base_dirs.config_dir().join("watchbot").join("config.toml");
        if platform_config.exists() {
            match Self::load_from_file(&platform_config) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(
                    path = %platform_config.display(),
                    error = %e,
                    "Ignoring config file"
                ),
            }
        }

        Self::default()
    }

    /// Applies `WATCHBOT_DATA_DIR` if set.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => self.with_data_dir(dir),
            _ => self,
        }
    }

    /// Converts a `ConfigFile` to `WatchbotConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        config.watch_file = file.watch_file.map(PathBuf::from);
        if let Some(timeout) = file.default_activity_timeout {
            config.default_activity_timeout = timeout.max(0.0);
        }
        if let Some(exhaustive) = file.exhaustive_suffix_matches {
            config.exhaustive_suffix_matches = exhaustive;
        }
        if let Some(logging) = file.logging {
            config.logging = LoggingSettings {
                format: logging.format,
                level: logging.level,
                file: logging.file.map(PathBuf::from),
            };
        }

        config
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Path of the persisted watch file.
    #[must_use]
    pub fn watch_file_path(&self) -> PathBuf {
        self.watch_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(WATCH_FILE_NAME))
    }
}
