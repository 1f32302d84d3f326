//! Per-user keyword watch registry.
//!
//! The registry owns every user's [`WatchSettings`] and derives the keyword
//! automaton from them. Mutations only mark the automaton dirty; callers
//! decide when to rebuild so several changes can share one rebuild.

use crate::matching::{Automaton, KeywordAutomaton, Trie};
use crate::models::{
    DEFAULT_ACTIVITY_TIMEOUT_SECS, Keyword, KeywordEntry, Subscription, UserId, WatchSettings,
    WatchStatus,
};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Registry of keyword watches keyed by user.
#[derive(Debug, Clone)]
pub struct WatchRegistry {
    watches: BTreeMap<UserId, WatchSettings>,
    default_activity_timeout: f64,
    dirty: bool,
}

impl Default for WatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            watches: BTreeMap::new(),
            default_activity_timeout: DEFAULT_ACTIVITY_TIMEOUT_SECS,
            dirty: false,
        }
    }

    /// Creates a registry from previously persisted settings.
    ///
    /// The registry starts dirty so the first rebuild picks the keywords up.
    #[must_use]
    pub fn from_settings(watches: BTreeMap<UserId, WatchSettings>) -> Self {
        Self {
            watches,
            default_activity_timeout: DEFAULT_ACTIVITY_TIMEOUT_SECS,
            dirty: true,
        }
    }

    /// Sets the activity timeout given to users on first use.
    #[must_use]
    pub const fn with_default_activity_timeout(mut self, seconds: f64) -> Self {
        self.default_activity_timeout = seconds;
        self
    }

    /// Returns a user's settings.
    #[must_use]
    pub fn get(&self, user: UserId) -> Option<&WatchSettings> {
        self.watches.get(&user)
    }

    /// Iterates over all users' settings in user order.
    pub fn iter(&self) -> impl Iterator<Item = (UserId, &WatchSettings)> {
        self.watches.iter().map(|(&user, settings)| (user, settings))
    }

    /// Number of users with settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.watches.len()
    }

    /// Returns `true` if no user has settings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.watches.is_empty()
    }

    /// Snapshot of a user's settings for display.
    #[must_use]
    pub fn status(&self, user: UserId, now: f64) -> Option<WatchStatus> {
        self.get(user)
            .map(|settings| WatchStatus::capture(settings, now))
    }

    /// Appends a keyword to the user's list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyKeyword`] if `text` is empty or whitespace only;
    /// the list is left unchanged.
    pub fn add_keyword(
        &mut self,
        user: UserId,
        text: &str,
        match_case: bool,
        whole_word: bool,
    ) -> Result<Keyword> {
        if text.trim().is_empty() {
            return Err(Error::EmptyKeyword);
        }

        let keyword = Keyword::new(text, match_case, whole_word);
        self.settings_mut(user).keywords.push(keyword.clone());
        self.dirty = true;

        tracing::info!(
            user = %user,
            keyword = %keyword.text,
            match_case,
            whole_word,
            "Added keyword watch"
        );
        Ok(keyword)
    }

    /// Removes the keyword at 1-based `index`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfRange`] if the index is invalid or the user
    /// has no keywords.
    pub fn remove_keyword(&mut self, user: UserId, index: usize) -> Result<Keyword> {
        let keywords = self
            .watches
            .get_mut(&user)
            .map(|settings| &mut settings.keywords)
            .ok_or(Error::IndexOutOfRange { index, len: 0 })?;

        if index == 0 || index > keywords.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: keywords.len(),
            });
        }

        let removed = keywords.remove(index - 1);
        self.dirty = true;
        tracing::info!(user = %user, index, keyword = %removed.text, "Removed keyword watch");
        Ok(removed)
    }

    /// Removes all of the user's keywords and returns how many there were.
    pub fn remove_all(&mut self, user: UserId) -> usize {
        let removed = self
            .watches
            .get_mut(&user)
            .map_or(0, |settings| std::mem::take(&mut settings.keywords).len());
        if removed > 0 {
            self.dirty = true;
            tracing::info!(user = %user, removed, "Cleared keyword watches");
        }
        removed
    }

    /// Turns the user's notifications on or off.
    pub fn set_enabled(&mut self, user: UserId, on: bool) {
        let settings = self.settings_mut(user);
        let changed = settings.enabled != on;
        settings.enabled = on;
        if changed {
            self.dirty = true;
        }
        tracing::info!(user = %user, on, "Set keyword watch notifications");
    }

    /// Sets the activity timeout. Values `<= 0` disable it.
    pub fn set_activity_timeout(&mut self, user: UserId, seconds: f64) {
        let seconds = if seconds > 0.0 { seconds } else { 0.0 };
        self.settings_mut(user).activity_timeout = seconds;
        tracing::info!(user = %user, seconds, "Set activity timeout");
    }

    /// Suppresses notifications for `duration` seconds from now.
    ///
    /// A duration of `0` lifts an active suppression.
    pub fn suppress(&mut self, user: UserId, duration: f64) {
        self.suppress_at(user, duration, crate::current_time());
    }

    /// Suppresses notifications for `duration` seconds from `now`.
    pub fn suppress_at(&mut self, user: UserId, duration: f64, now: f64) {
        self.settings_mut(user).suppressed_until = Some(now + duration);
        tracing::info!(user = %user, duration, "Suppressed keyword watches");
    }

    /// Returns `true` if the keyword set changed since the last rebuild.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Builds an automaton over every enabled user's keywords and clears the
    /// dirty flag.
    pub fn rebuild_automaton(&mut self) -> KeywordAutomaton {
        let automaton = self.build_automaton();
        self.dirty = false;
        automaton
    }

    /// Builds an automaton over every enabled user's keywords.
    ///
    /// Keywords with the same case-folded text share one entry holding every
    /// user's subscription. The result depends only on the settings, not on
    /// the order in which they were added.
    #[must_use]
    pub fn build_automaton(&self) -> KeywordAutomaton {
        let mut entries: BTreeMap<String, Vec<Subscription>> = BTreeMap::new();
        for (&user, settings) in &self.watches {
            if !settings.enabled {
                continue;
            }
            for keyword in &settings.keywords {
                entries.entry(keyword.folded()).or_default().push(Subscription {
                    subscriber: user,
                    keyword: keyword.text.clone(),
                    match_case: keyword.match_case,
                    whole_word: keyword.whole_word,
                });
            }
        }

        let mut trie = Trie::new();
        for (text, subscriptions) in entries {
            let entry = KeywordEntry {
                text: text.clone(),
                subscriptions,
            };
            if let Err(e) = trie.insert(&text, entry) {
                tracing::warn!(error = %e, "Skipping keyword that cannot be matched");
            }
        }

        let automaton = Automaton::build(trie);
        metrics::counter!("watch_automaton_rebuilds_total").increment(1);
        tracing::debug!(
            keywords = automaton.len(),
            nodes = automaton.trie().node_count(),
            "Rebuilt keyword automaton"
        );
        automaton
    }

    /// Returns the settings map, for persistence.
    #[must_use]
    pub const fn settings(&self) -> &BTreeMap<UserId, WatchSettings> {
        &self.watches
    }

    fn settings_mut(&mut self, user: UserId) -> &mut WatchSettings {
        let timeout = self.default_activity_timeout;
        self.watches
            .entry(user)
            .or_insert_with(|| WatchSettings::new(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: UserId = UserId::new(1);
    const BOB: UserId = UserId::new(2);

    fn hits(automaton: &KeywordAutomaton, text: &str) -> Vec<(usize, String, Vec<UserId>)> {
        automaton
            .find_all(text)
            .map(|(i, entry)| {
                let mut users: Vec<UserId> =
                    entry.subscriptions.iter().map(|s| s.subscriber).collect();
                users.sort();
                (i, entry.text.clone(), users)
            })
            .collect()
    }

    #[test]
    fn test_add_keyword_creates_settings() {
        let mut registry = WatchRegistry::new().with_default_activity_timeout(60.0);
        registry.add_keyword(ALICE, "rust", false, true).unwrap();

        let settings = registry.get(ALICE).unwrap();
        assert!(settings.enabled);
        assert!((settings.activity_timeout - 60.0).abs() < f64::EPSILON);
        assert_eq!(settings.keywords, vec![Keyword::new("rust", false, true)]);
        assert!(registry.is_dirty());
    }

    #[test]
    fn test_add_empty_keyword_rejected() {
        let mut registry = WatchRegistry::new();
        registry.add_keyword(ALICE, "rust", false, false).unwrap();

        assert!(matches!(
            registry.add_keyword(ALICE, "", false, false),
            Err(Error::EmptyKeyword)
        ));
        assert!(matches!(
            registry.add_keyword(ALICE, "   ", false, false),
            Err(Error::EmptyKeyword)
        ));
        assert_eq!(registry.get(ALICE).unwrap().keywords.len(), 1);
    }

    #[test]
    fn test_remove_keyword_by_position() {
        let mut registry = WatchRegistry::new();
        for word in ["one", "two", "three"] {
            registry.add_keyword(ALICE, word, false, false).unwrap();
        }

        let removed = registry.remove_keyword(ALICE, 2).unwrap();
        assert_eq!(removed.text, "two");
        let left: Vec<&str> = registry
            .get(ALICE)
            .unwrap()
            .keywords
            .iter()
            .map(|k| k.text.as_str())
            .collect();
        assert_eq!(left, vec!["one", "three"]);
    }

    #[test]
    fn test_remove_keyword_out_of_range() {
        let mut registry = WatchRegistry::new();
        assert!(matches!(
            registry.remove_keyword(ALICE, 1),
            Err(Error::IndexOutOfRange { index: 1, len: 0 })
        ));

        registry.add_keyword(ALICE, "rust", false, false).unwrap();
        assert!(matches!(
            registry.remove_keyword(ALICE, 0),
            Err(Error::IndexOutOfRange { index: 0, len: 1 })
        ));
        assert!(matches!(
            registry.remove_keyword(ALICE, 2),
            Err(Error::IndexOutOfRange { index: 2, len: 1 })
        ));
    }

    #[test]
    fn test_remove_all_is_noop_when_empty() {
        let mut registry = WatchRegistry::new();
        assert_eq!(registry.remove_all(ALICE), 0);
        assert!(!registry.is_dirty());

        registry.add_keyword(ALICE, "a", false, false).unwrap();
        registry.add_keyword(ALICE, "b", false, false).unwrap();
        assert_eq!(registry.remove_all(ALICE), 2);
        assert!(registry.get(ALICE).unwrap().keywords.is_empty());
    }

    #[test]
    fn test_activity_timeout_non_positive_disables() {
        let mut registry = WatchRegistry::new();
        registry.set_activity_timeout(ALICE, -5.0);
        assert!(registry.get(ALICE).unwrap().activity_timeout.abs() < f64::EPSILON);
        registry.set_activity_timeout(ALICE, 30.0);
        assert!((registry.get(ALICE).unwrap().activity_timeout - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_suppress_zero_lifts_suppression() {
        let mut registry = WatchRegistry::new();
        registry.suppress_at(ALICE, 600.0, 1000.0);
        assert!(registry.get(ALICE).unwrap().is_suppressed(1001.0));

        registry.suppress_at(ALICE, 0.0, 1002.0);
        assert!(!registry.get(ALICE).unwrap().is_suppressed(1002.0));
    }

    #[test]
    fn test_rebuild_groups_by_folded_text() {
        let mut registry = WatchRegistry::new();
        registry.add_keyword(ALICE, "Rust", true, false).unwrap();
        registry.add_keyword(BOB, "rust", false, true).unwrap();

        let automaton = registry.rebuild_automaton();
        assert!(!registry.is_dirty());
        assert_eq!(automaton.len(), 1);

        let entry = automaton.trie().get("rust").unwrap();
        assert_eq!(entry.subscriptions.len(), 2);
        assert_eq!(entry.subscriptions[0].keyword, "Rust");
        assert!(entry.subscriptions[0].match_case);
        assert_eq!(entry.subscriptions[1].subscriber, BOB);
        assert!(entry.subscriptions[1].whole_word);
    }

    #[test]
    fn test_rebuild_skips_disabled_users() {
        let mut registry = WatchRegistry::new();
        registry.add_keyword(ALICE, "rust", false, false).unwrap();
        registry.add_keyword(BOB, "go", false, false).unwrap();
        registry.set_enabled(BOB, false);

        let automaton = registry.rebuild_automaton();
        assert_eq!(hits(&automaton, "rust and go").len(), 1);
    }

    #[test]
    fn test_rebuild_is_order_independent() {
        let mut first = WatchRegistry::new();
        first.add_keyword(ALICE, "cat", false, false).unwrap();
        first.add_keyword(BOB, "Cat", true, false).unwrap();
        first.add_keyword(BOB, "dog", false, false).unwrap();

        let mut second = WatchRegistry::new();
        second.add_keyword(BOB, "dog", false, false).unwrap();
        second.add_keyword(BOB, "Cat", true, false).unwrap();
        second.add_keyword(ALICE, "cat", false, false).unwrap();

        let text = "the cat chased the dog";
        assert_eq!(
            hits(&first.build_automaton(), text),
            hits(&second.build_automaton(), text)
        );
    }

    #[test]
    fn test_status_snapshot() {
        let mut registry = WatchRegistry::new();
        assert!(registry.status(ALICE, 0.0).is_none());

        registry.add_keyword(ALICE, "rust", false, false).unwrap();
        registry.suppress_at(ALICE, 30.0, 100.0);
        let status = registry.status(ALICE, 110.0).unwrap();
        assert!(status.enabled);
        assert_eq!(status.suppressed_for, Some(20.0));
        assert_eq!(status.keywords.len(), 1);
    }
}
