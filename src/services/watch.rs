//! Keyword watch service.
//!
//! Owns the registry, the current automaton and the store. The automaton is
//! held behind an `Arc` so a message scan keeps using the snapshot it started
//! with while a rebuild swaps in a new one.

use super::{NotificationRouter, Roster, WatchRegistry};
use crate::config::WatchbotConfig;
use crate::matching::KeywordAutomaton;
use crate::models::{ChatMessage, Keyword, Notification, UserId, WatchStatus};
use crate::storage::{JsonWatchStore, MemoryWatchStore, WatchStore};
use crate::{Error, Result};
use std::sync::{Arc, RwLock};
use tracing::instrument;

/// Thread-safe entry point for watch management and message routing.
pub struct WatchService {
    registry: RwLock<WatchRegistry>,
    automaton: RwLock<Arc<KeywordAutomaton>>,
    store: Box<dyn WatchStore>,
    router: NotificationRouter,
}

impl std::fmt::Debug for WatchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchService")
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl WatchService {
    /// Creates a service that loads its watches from `store` and builds the
    /// initial automaton.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be loaded.
    pub fn with_store(store: impl WatchStore + 'static, default_activity_timeout: f64) -> Result<Self> {
        let watches = store.load()?;
        let mut registry = WatchRegistry::from_settings(watches)
            .with_default_activity_timeout(default_activity_timeout);
        let automaton = registry.rebuild_automaton();

        tracing::info!(
            users = registry.len(),
            keywords = automaton.len(),
            "Loaded keyword watches"
        );

        Ok(Self {
            registry: RwLock::new(registry),
            automaton: RwLock::new(Arc::new(automaton)),
            store: Box::new(store),
            router: NotificationRouter::new(),
        })
    }

    /// Creates an empty service that keeps its watches in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            registry: RwLock::new(WatchRegistry::new()),
            automaton: RwLock::new(Arc::new(KeywordAutomaton::default())),
            store: Box::new(MemoryWatchStore::new()),
            router: NotificationRouter::new(),
        }
    }

    /// Opens the watch file named by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the watch file exists but cannot be read or parsed.
    pub fn open(config: &WatchbotConfig) -> Result<Self> {
        let store = JsonWatchStore::new(config.watch_file_path());
        Ok(Self::with_store(store, config.default_activity_timeout)?.with_router(
            NotificationRouter::new().with_exhaustive_matches(config.exhaustive_suffix_matches),
        ))
    }

    /// Replaces the router.
    #[must_use]
    pub fn with_router(mut self, router: NotificationRouter) -> Self {
        self.router = router;
        self
    }

    /// Adds a keyword for `user`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyKeyword`] for blank keywords, or an error if the
    /// watches cannot be saved.
    #[instrument(skip(self), fields(operation = "watch.add"))]
    pub fn add_keyword(
        &self,
        user: UserId,
        text: &str,
        match_case: bool,
        whole_word: bool,
    ) -> Result<Keyword> {
        self.mutate("add_keyword", |registry| {
            registry.add_keyword(user, text, match_case, whole_word)
        })
    }

    /// Removes the keyword at 1-based `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] for an invalid index, or an error if
    /// the watches cannot be saved.
    #[instrument(skip(self), fields(operation = "watch.delete"))]
    pub fn remove_keyword(&self, user: UserId, index: usize) -> Result<Keyword> {
        self.mutate("remove_keyword", |registry| registry.remove_keyword(user, index))
    }

    /// Removes all of the user's keywords.
    ///
    /// # Errors
    ///
    /// Returns an error if the watches cannot be saved.
    #[instrument(skip(self), fields(operation = "watch.delete_all"))]
    pub fn remove_all(&self, user: UserId) -> Result<usize> {
        self.mutate("remove_all", |registry| Ok(registry.remove_all(user)))
    }

    /// Turns the user's notifications on or off.
    ///
    /// # Errors
    ///
    /// Returns an error if the watches cannot be saved.
    #[instrument(skip(self), fields(operation = "watch.toggle"))]
    pub fn set_enabled(&self, user: UserId, on: bool) -> Result<()> {
        self.mutate("set_enabled", |registry| {
            registry.set_enabled(user, on);
            Ok(())
        })
    }

    /// Sets the user's activity timeout in seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the watches cannot be saved.
    #[instrument(skip(self), fields(operation = "watch.activity_timeout"))]
    pub fn set_activity_timeout(&self, user: UserId, seconds: f64) -> Result<()> {
        self.mutate("set_activity_timeout", |registry| {
            registry.set_activity_timeout(user, seconds);
            Ok(())
        })
    }

    /// Suppresses the user's notifications for `duration` seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the watches cannot be saved.
    pub fn suppress(&self, user: UserId, duration: f64) -> Result<()> {
        self.suppress_at(user, duration, crate::current_time())
    }

    /// Suppresses the user's notifications for `duration` seconds from `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the watches cannot be saved.
    #[instrument(skip(self), fields(operation = "watch.suppress"))]
    pub fn suppress_at(&self, user: UserId, duration: f64, now: f64) -> Result<()> {
        self.mutate("suppress", |registry| {
            registry.suppress_at(user, duration, now);
            Ok(())
        })
    }

    /// Returns a snapshot of the user's settings, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn status(&self, user: UserId, now: f64) -> Result<Option<WatchStatus>> {
        let registry = self
            .registry
            .read()
            .map_err(|_| lock_poisoned("status"))?;
        Ok(registry.status(user, now))
    }

    /// Rebuilds the automaton from the current registry and swaps it in.
    ///
    /// # Errors
    ///
    /// Returns an error if a lock is poisoned.
    pub fn rebuild_automaton(&self) -> Result<()> {
        let mut registry = self
            .registry
            .write()
            .map_err(|_| lock_poisoned("rebuild_automaton"))?;
        let automaton = registry.rebuild_automaton();
        self.swap_automaton(automaton)
    }

    /// Returns the automaton currently used for scanning.
    ///
    /// # Errors
    ///
    /// Returns an error if the automaton lock is poisoned.
    pub fn automaton(&self) -> Result<Arc<KeywordAutomaton>> {
        self.automaton
            .read()
            .map(|guard| Arc::clone(&guard))
            .map_err(|_| lock_poisoned("automaton"))
    }

    /// Scans `message` and returns the notifications to send.
    ///
    /// # Errors
    ///
    /// Returns an error if a lock is poisoned.
    #[instrument(skip_all, fields(operation = "watch.on_message", chat = %message.chat, author = %message.author))]
    pub fn on_message(
        &self,
        message: &ChatMessage,
        roster: &impl Roster,
        now: f64,
    ) -> Result<Vec<Notification>> {
        if message.text.is_empty() {
            return Ok(Vec::new());
        }

        let automaton = self.automaton()?;
        let registry = self
            .registry
            .read()
            .map_err(|_| lock_poisoned("on_message"))?;
        Ok(self
            .router
            .route(&automaton, &registry, message, roster, now))
    }

    /// Applies `change` to the registry, rebuilds the automaton if the keyword
    /// set changed and persists the result.
    ///
    /// The automaton always reflects the registry, even when the save fails.
    fn mutate<T>(
        &self,
        operation: &str,
        change: impl FnOnce(&mut WatchRegistry) -> Result<T>,
    ) -> Result<T> {
        let mut registry = self
            .registry
            .write()
            .map_err(|_| lock_poisoned(operation))?;
        let value = change(&mut registry)?;

        if registry.is_dirty() {
            let automaton = registry.rebuild_automaton();
            self.swap_automaton(automaton)?;
        }

        if let Err(err) = self.store.save(registry.settings()) {
            tracing::warn!(operation, error = %err, "Failed to persist keyword watches");
            return Err(err);
        }
        Ok(value)
    }

    fn swap_automaton(&self, automaton: KeywordAutomaton) -> Result<()> {
        let mut current = self
            .automaton
            .write()
            .map_err(|_| lock_poisoned("swap_automaton"))?;
        *current = Arc::new(automaton);
        Ok(())
    }
}

fn lock_poisoned(operation: &str) -> Error {
    Error::OperationFailed {
        operation: operation.to_string(),
        cause: "Lock poisoned".to_string(),
    }
}
