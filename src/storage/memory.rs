//! In-memory watch store.

use super::WatchStore;
use crate::models::{UserId, WatchSettings};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Keeps the last saved watches in memory. Useful for tests and for running
/// without a data directory.
#[derive(Debug, Default)]
pub struct MemoryWatchStore {
    watches: Mutex<BTreeMap<UserId, WatchSettings>>,
}

impl MemoryWatchStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with `watches`.
    #[must_use]
    pub fn with_watches(watches: BTreeMap<UserId, WatchSettings>) -> Self {
        Self {
            watches: Mutex::new(watches),
        }
    }
}

impl WatchStore for MemoryWatchStore {
    fn load(&self) -> Result<BTreeMap<UserId, WatchSettings>> {
        let guard = self.watches.lock().map_err(|_| Error::OperationFailed {
            operation: "load_watches".to_string(),
            cause: "Lock poisoned".to_string(),
        })?;
        Ok(guard.clone())
    }

    fn save(&self, watches: &BTreeMap<UserId, WatchSettings>) -> Result<()> {
        let mut guard = self.watches.lock().map_err(|_| Error::OperationFailed {
            operation: "save_watches".to_string(),
            cause: "Lock poisoned".to_string(),
        })?;
        guard.clone_from(watches);
        Ok(())
    }
}
