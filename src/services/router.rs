//! Notification routing for keyword watches.
//!
//! Turns raw automaton hits for one message into at most one notification
//! per user: each hit is re-checked against the subscription's case and
//! whole-word flags, then every user with a surviving keyword is checked for
//! eligibility.

use crate::matching::{KeywordAutomaton, fold_text};
use crate::models::{
    ChatId, ChatKind, ChatMessage, MatchEvent, Notification, Presence, QuotedMessage,
    Subscription, UserId, WatchSettings,
};
use crate::services::WatchRegistry;
use std::collections::BTreeMap;

/// Runtime user information the router needs from the chat session.
pub trait Roster {
    /// The user's last known presence, if the user has been seen.
    fn presence(&self, user: UserId) -> Option<Presence>;

    /// Unix time of the user's last message, if the user has been seen.
    fn last_activity(&self, user: UserId) -> Option<f64>;

    /// Whether `user` is a member of the group chat `chat`.
    fn is_member(&self, chat: ChatId, user: UserId) -> bool;
}

/// Why a matched user was not notified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The user wrote the message.
    Author,
    /// The user has no settings (stale automaton).
    NoSettings,
    /// The user turned notifications off (stale automaton).
    Disabled,
    /// The user's presence is available.
    Available,
    /// The user sent a message within their activity timeout.
    RecentlyActive,
    /// The user suppressed notifications.
    Suppressed,
    /// The user is not in the group chat.
    NotMember,
}

impl SkipReason {
    /// Returns the reason as a metric label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::NoSettings => "no_settings",
            Self::Disabled => "disabled",
            Self::Available => "available",
            Self::RecentlyActive => "recently_active",
            Self::Suppressed => "suppressed",
            Self::NotMember => "not_member",
        }
    }
}

/// Decides who gets notified about a message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationRouter {
    exhaustive: bool,
}

impl NotificationRouter {
    /// Creates a router that reports one automaton hit per position.
    #[must_use]
    pub const fn new() -> Self {
        Self { exhaustive: false }
    }

    /// Also reports keywords that are suffixes of a longer hit at the same
    /// position.
    #[must_use]
    pub const fn with_exhaustive_matches(mut self, exhaustive: bool) -> Self {
        self.exhaustive = exhaustive;
        self
    }

    /// Scans case-folded text and yields the raw hits.
    pub fn scan<'a>(
        &self,
        automaton: &'a KeywordAutomaton,
        folded: &'a str,
    ) -> impl Iterator<Item = MatchEvent<'a>> + 'a {
        let matches = if self.exhaustive {
            automaton.find_all_exhaustive(folded)
        } else {
            automaton.find_all(folded)
        };
        matches.map(|(end_index, entry)| MatchEvent { end_index, entry })
    }

    /// Collects verified keyword matches per user.
    ///
    /// Keywords are in the case each user entered them, deduplicated, in
    /// first-match order.
    #[must_use]
    pub fn collect_matches(
        &self,
        automaton: &KeywordAutomaton,
        text: &str,
    ) -> BTreeMap<UserId, Vec<String>> {
        let chars: Vec<char> = text.chars().collect();
        let folded = fold_text(text);
        let mut matched: BTreeMap<UserId, Vec<String>> = BTreeMap::new();

        for event in self.scan(automaton, &folded) {
            metrics::counter!("watch_keyword_hits_total").increment(1);
            for subscription in event.subscriptions() {
                if !verify_subscription(&chars, event.end_index, subscription) {
                    continue;
                }
                let keywords = matched.entry(subscription.subscriber).or_default();
                if !keywords.contains(&subscription.keyword) {
                    keywords.push(subscription.keyword.clone());
                }
            }
        }

        matched
    }

    /// Routes `message`, returning one notification per eligible user ordered
    /// by user ID.
    pub fn route(
        &self,
        automaton: &KeywordAutomaton,
        registry: &WatchRegistry,
        message: &ChatMessage,
        roster: &impl Roster,
        now: f64,
    ) -> Vec<Notification> {
        let matched = self.collect_matches(automaton, &message.text);
        if matched.is_empty() {
            return Vec::new();
        }

        let quote = QuotedMessage::from_message(message);
        let mut notifications = Vec::new();
        for (user, keywords) in matched {
            if let Some(reason) = check_eligibility(user, registry.get(user), message, roster, now)
            {
                metrics::counter!("watch_notifications_skipped_total", "reason" => reason.as_str())
                    .increment(1);
                tracing::debug!(user = %user, reason = reason.as_str(), "Skipping notification");
                continue;
            }

            metrics::counter!("watch_notifications_total").increment(1);
            tracing::info!(user = %user, keywords = ?keywords, "Keyword watch matched");
            notifications.push(Notification {
                recipient: user,
                keywords,
                quote: quote.clone(),
            });
        }
        notifications
    }
}

/// Returns why `user` should not be notified about `message`, if anything.
#[must_use]
pub fn check_eligibility(
    user: UserId,
    settings: Option<&WatchSettings>,
    message: &ChatMessage,
    roster: &impl Roster,
    now: f64,
) -> Option<SkipReason> {
    if user == message.author {
        return Some(SkipReason::Author);
    }
    let Some(settings) = settings else {
        return Some(SkipReason::NoSettings);
    };
    if !settings.enabled {
        return Some(SkipReason::Disabled);
    }
    if roster.presence(user) == Some(Presence::Available) {
        return Some(SkipReason::Available);
    }
    if roster
        .last_activity(user)
        .is_some_and(|last| settings.is_recently_active(last, now))
    {
        return Some(SkipReason::RecentlyActive);
    }
    if settings.is_suppressed(now) {
        return Some(SkipReason::Suppressed);
    }
    if message.kind == ChatKind::Group && !roster.is_member(message.chat, user) {
        return Some(SkipReason::NotMember);
    }
    None
}

/// Applies a subscription's case and whole-word flags to a hit ending at
/// `end_index` in `chars`.
#[must_use]
pub fn verify_subscription(chars: &[char], end_index: usize, subscription: &Subscription) -> bool {
    let len = subscription.keyword.chars().count();
    let Some(start) = (end_index + 1).checked_sub(len) else {
        return false;
    };
    if end_index >= chars.len() {
        return false;
    }

    if subscription.match_case && !matches_case(&chars[start..=end_index], &subscription.keyword)
    {
        return false;
    }
    if subscription.whole_word && !on_word_boundaries(chars, start, end_index) {
        return false;
    }
    true
}

fn matches_case(window: &[char], keyword: &str) -> bool {
    window.iter().copied().eq(keyword.chars())
}

/// Boundary test on both ends of `chars[start..=end]`.
///
/// A side fails when the characters on either side of it are in the same
/// class (both alphanumeric or both not).
fn on_word_boundaries(chars: &[char], start: usize, end: usize) -> bool {
    let is_alnum = |c: char| c.is_alphanumeric();

    if end + 1 < chars.len() && is_alnum(chars[end]) == is_alnum(chars[end + 1]) {
        return false;
    }
    if start > 0 && is_alnum(chars[start - 1]) == is_alnum(chars[start]) {
        return false;
    }
    true
}
