//! Persistence for keyword watches.
//!
//! Watches are loaded once at startup and written back after every change.
//! [`JsonWatchStore`] keeps them in a single JSON document; [`MemoryWatchStore`]
//! keeps them in process memory.

mod json;
mod memory;

pub use json::JsonWatchStore;
pub use memory::MemoryWatchStore;

use crate::Result;
use crate::models::{UserId, WatchSettings};
use std::collections::BTreeMap;

/// Loads and saves the full set of watches.
pub trait WatchStore: Send + Sync {
    /// Loads every stored watch.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read or parsed.
    fn load(&self) -> Result<BTreeMap<UserId, WatchSettings>>;

    /// Replaces the stored watches with `watches`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, watches: &BTreeMap<UserId, WatchSettings>) -> Result<()>;
}
