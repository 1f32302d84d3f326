//! JSON file persistence for keyword watches.
//!
//! The file holds one object keyed by stringified user ID:
//!
//! ```json
//! {
//!   "42": {
//!     "on": true,
//!     "activityTimeout": 180.0,
//!     "_suppressed": 1700000000.5,
//!     "keywords": [{"keyword": "CAD", "wholeWord": true, "matchCase": true}]
//!   }
//! }
//! ```

use super::WatchStore;
use crate::models::{DEFAULT_ACTIVITY_TIMEOUT_SECS, Keyword, UserId, WatchSettings};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Serialized keyword.
#[derive(Debug, Serialize, Deserialize)]
struct StoredKeyword {
    keyword: String,
    #[serde(rename = "wholeWord", default)]
    whole_word: bool,
    #[serde(rename = "matchCase", default)]
    match_case: bool,
}

/// Serialized watch settings for one user.
#[derive(Debug, Serialize, Deserialize)]
struct StoredWatch {
    #[serde(default = "default_on")]
    on: bool,
    #[serde(rename = "activityTimeout", default = "default_activity_timeout")]
    activity_timeout: f64,
    #[serde(default)]
    keywords: Vec<StoredKeyword>,
    #[serde(rename = "_suppressed", default, skip_serializing_if = "Option::is_none")]
    suppressed: Option<f64>,
}

const fn default_on() -> bool {
    true
}

const fn default_activity_timeout() -> f64 {
    DEFAULT_ACTIVITY_TIMEOUT_SECS
}

impl From<&WatchSettings> for StoredWatch {
    fn from(settings: &WatchSettings) -> Self {
        Self {
            on: settings.enabled,
            activity_timeout: settings.activity_timeout,
            keywords: settings
                .keywords
                .iter()
                .map(|k| StoredKeyword {
                    keyword: k.text.clone(),
                    whole_word: k.whole_word,
                    match_case: k.match_case,
                })
                .collect(),
            suppressed: settings.suppressed_until,
        }
    }
}

impl StoredWatch {
    fn into_settings(self) -> WatchSettings {
        WatchSettings {
            enabled: self.on,
            activity_timeout: self.activity_timeout,
            suppressed_until: self.suppressed,
            keywords: self
                .keywords
                .into_iter()
                .map(|k| Keyword::new(k.keyword, k.match_case, k.whole_word))
                .collect(),
        }
    }
}

/// Stores all watches in a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonWatchStore {
    path: PathBuf,
}

impl JsonWatchStore {
    /// Creates a store backed by `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses the JSON document, skipping entries with non-numeric keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not a valid watch map.
    pub fn parse(contents: &str) -> Result<BTreeMap<UserId, WatchSettings>> {
        let stored: BTreeMap<String, StoredWatch> =
            serde_json::from_str(contents).map_err(|e| Error::OperationFailed {
                operation: "parse_watch_file".to_string(),
                cause: e.to_string(),
            })?;

        let mut watches = BTreeMap::new();
        for (key, watch) in stored {
            match key.parse::<UserId>() {
                Ok(user) => {
                    watches.insert(user, watch.into_settings());
                },
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Skipping watch entry with invalid user ID");
                },
            }
        }
        Ok(watches)
    }

    /// Renders the watch map as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn render(watches: &BTreeMap<UserId, WatchSettings>) -> Result<String> {
        let stored: BTreeMap<String, StoredWatch> = watches
            .iter()
            .map(|(user, settings)| (user.to_string(), StoredWatch::from(settings)))
            .collect();
        serde_json::to_string_pretty(&stored).map_err(|e| Error::OperationFailed {
            operation: "serialize_watches".to_string(),
            cause: e.to_string(),
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl WatchStore for JsonWatchStore {
    fn load(&self) -> Result<BTreeMap<UserId, WatchSettings>> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "Watch file missing, starting empty");
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path).map_err(|e| Error::OperationFailed {
            operation: "read_watch_file".to_string(),
            cause: format!("{}: {}", self.path.display(), e),
        })?;
        let watches = Self::parse(&contents)?;
        tracing::debug!(path = %self.path.display(), users = watches.len(), "Loaded keyword watches");
        Ok(watches)
    }

    fn save(&self, watches: &BTreeMap<UserId, WatchSettings>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
                operation: "create_watch_dir".to_string(),
                cause: e.to_string(),
            })?;
        }

        let contents = Self::render(watches)?;
        let temp = self.temp_path();
        fs::write(&temp, contents).map_err(|e| Error::OperationFailed {
            operation: "write_watch_file".to_string(),
            cause: format!("{}: {}", temp.display(), e),
        })?;
        fs::rename(&temp, &self.path).map_err(|e| Error::OperationFailed {
            operation: "write_watch_file".to_string(),
            cause: format!("{}: {}", self.path.display(), e),
        })?;
        Ok(())
    }
}
