//! Keyword watch settings and match types.

use super::UserId;
use crate::matching::fold_text;
use serde::{Deserialize, Serialize};

/// Activity timeout applied to newly created watch settings, in seconds.
pub const DEFAULT_ACTIVITY_TIMEOUT_SECS: f64 = 180.0;

/// A keyword registered by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    /// The keyword as entered, original case preserved.
    pub text: String,
    /// Require the exact case of `text` at the match site.
    pub match_case: bool,
    /// Require word boundaries on both sides of the match.
    pub whole_word: bool,
}

impl Keyword {
    /// Creates a keyword.
    #[must_use]
    pub fn new(text: impl Into<String>, match_case: bool, whole_word: bool) -> Self {
        Self {
            text: text.into(),
            match_case,
            whole_word,
        }
    }

    /// Returns the case-folded text used as the automaton key.
    #[must_use]
    pub fn folded(&self) -> String {
        fold_text(&self.text)
    }
}

/// Per-user keyword watch configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchSettings {
    /// Master on/off switch.
    pub enabled: bool,
    /// Seconds after the user's own last activity during which nothing is
    /// sent. `0` disables the check.
    pub activity_timeout: f64,
    /// Unix time until which notifications are suppressed.
    pub suppressed_until: Option<f64>,
    /// Keywords in insertion order; users address them by 1-based position.
    pub keywords: Vec<Keyword>,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_TIMEOUT_SECS)
    }
}

impl WatchSettings {
    /// Creates enabled settings with no keywords.
    #[must_use]
    pub const fn new(activity_timeout: f64) -> Self {
        Self {
            enabled: true,
            activity_timeout,
            suppressed_until: None,
            keywords: Vec::new(),
        }
    }

    /// Returns `true` while an explicit suppression is in effect.
    #[must_use]
    pub fn is_suppressed(&self, now: f64) -> bool {
        self.suppressed_until.is_some_and(|until| now < until)
    }

    /// Seconds of suppression left, if any.
    #[must_use]
    pub fn suppression_remaining(&self, now: f64) -> Option<f64> {
        self.suppressed_until
            .map(|until| until - now)
            .filter(|remaining| *remaining > 0.0)
    }

    /// Returns `true` if `last_activity` is recent enough to hold back
    /// notifications.
    #[must_use]
    pub fn is_recently_active(&self, last_activity: f64, now: f64) -> bool {
        self.activity_timeout > 0.0 && now - last_activity < self.activity_timeout
    }
}

/// One user's registration of a keyword, as stored in the automaton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    /// The watching user.
    pub subscriber: UserId,
    /// The keyword in the case the user entered it.
    pub keyword: String,
    /// Require exact case.
    pub match_case: bool,
    /// Require word boundaries.
    pub whole_word: bool,
}

/// Automaton payload: every subscription sharing one case-folded keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordEntry {
    /// Case-folded keyword text.
    pub text: String,
    /// Subscriptions in registration order.
    pub subscriptions: Vec<Subscription>,
}

/// A raw automaton hit for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchEvent<'a> {
    /// Character index of the last character of the match.
    pub end_index: usize,
    /// The matched entry.
    pub entry: &'a KeywordEntry,
}

impl MatchEvent<'_> {
    /// Case-folded keyword text.
    #[must_use]
    pub fn keyword_text(&self) -> &str {
        &self.entry.text
    }

    /// Every subscription registered for the keyword.
    #[must_use]
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.entry.subscriptions
    }
}

/// Read-only snapshot of a user's watch settings for display.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchStatus {
    /// Whether notifications are on.
    pub enabled: bool,
    /// Seconds of suppression left.
    pub suppressed_for: Option<f64>,
    /// Activity timeout in seconds; `0` means disabled.
    pub activity_timeout: f64,
    /// Keywords in display order.
    pub keywords: Vec<Keyword>,
}

impl WatchStatus {
    /// Captures `settings` as seen at `now`.
    #[must_use]
    pub fn capture(settings: &WatchSettings, now: f64) -> Self {
        Self {
            enabled: settings.enabled,
            suppressed_for: settings.suppression_remaining(now),
            activity_timeout: settings.activity_timeout,
            keywords: settings.keywords.clone(),
        }
    }
}
