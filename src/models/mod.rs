//! Data models for watchbot.
//!
//! This module contains the core data structures shared by the matcher, the
//! watch registry and the notification router.

mod ids;
mod message;
mod watch;

pub use ids::{ChatId, UserId};
pub use message::{ChatKind, ChatMessage, Notification, Presence, QuotedMessage};
pub use watch::{
    DEFAULT_ACTIVITY_TIMEOUT_SECS, Keyword, KeywordEntry, MatchEvent, Subscription, WatchSettings,
    WatchStatus,
};
