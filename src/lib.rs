//! # Watchbot
//!
//! Keyword-watch notifications for group chat bots.
//!
//! Users register keywords they care about; every ordinary chat message is
//! scanned once against all registered keywords and the matching users are
//! sent a private notification, subject to presence, activity and
//! suppression rules.
//!
//! ## Features
//!
//! - Aho-Corasick multi-pattern matching in a single pass per message
//! - Per-keyword case-sensitivity and whole-word filtering
//! - Per-user on/off switch, activity timeout and temporary suppression
//! - JSON persistence compatible with existing watch files
//! - A `watch` chat command handler and a `scan` CLI for offline replay
//!
//! ## Example
//!
//! ```rust
//! use watchbot::models::{ChatId, ChatMessage, UserId};
//! use watchbot::services::{InMemoryRoster, WatchService};
//!
//! let service = WatchService::in_memory();
//! service.add_keyword(UserId::new(2), "rust", false, false)?;
//!
//! let message = ChatMessage::group("I love Rust", UserId::new(1), ChatId::new(10));
//! let mut roster = InMemoryRoster::new();
//! roster.add_member(ChatId::new(10), UserId::new(2));
//!
//! let notifications = service.on_message(&message, &roster, message.timestamp)?;
//! assert_eq!(notifications.len(), 1);
//! assert_eq!(notifications[0].keywords, vec!["rust".to_string()]);
//! # Ok::<(), watchbot::Error>(())
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
#![allow(clippy::multiple_crate_versions)]

use thiserror::Error as ThisError;

pub mod cli;
pub mod commands;
pub mod config;
pub mod matching;
pub mod models;
pub mod observability;
pub mod services;
pub mod storage;
pub mod util;

pub use config::WatchbotConfig;
pub use matching::{Automaton, KeywordAutomaton, Trie};
pub use models::{
    ChatId, ChatKind, ChatMessage, Keyword, MatchEvent, Notification, Presence, UserId,
    WatchSettings,
};
pub use services::{InMemoryRoster, NotificationRouter, Roster, WatchRegistry, WatchService};
pub use storage::{JsonWatchStore, MemoryWatchStore, WatchStore};

/// Error type for watchbot operations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `EmptyKeyword` | Adding a keyword that is empty or whitespace only |
/// | `IndexOutOfRange` | Deleting a keyword by a number that does not exist |
/// | `NotFound` | Deleting a string that was never inserted into a trie |
/// | `InvalidInput` | Malformed command arguments |
/// | `OperationFailed` | I/O, JSON/TOML parsing, lock poisoning, logging setup |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A keyword with no visible characters was rejected.
    #[error("empty keywords are not allowed")]
    EmptyKeyword,

    /// A 1-based keyword number does not refer to an existing keyword.
    ///
    /// Also raised when the user has no keywords at all (`len == 0`).
    #[error("invalid keyword number {index} (you have {len} keyword watches)")]
    IndexOutOfRange {
        /// The 1-based index that was requested.
        index: usize,
        /// Number of keywords the user has.
        len: usize,
    },

    /// A string is not present in the trie.
    ///
    /// Internal consistency signal only; the registry rebuilds the automaton
    /// from scratch and never deletes from a trie it did not fill.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input was provided.
    ///
    /// Raised when:
    /// - A command has the wrong number of arguments
    /// - A flag is not one of `true`/`false`/`yes`/`no`
    /// - A duration or keyword number is not a number
    /// - A quoted argument is not terminated
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An operation failed.
    ///
    /// Raised when:
    /// - The watch file cannot be read, parsed or written
    /// - The configuration file cannot be read or parsed
    /// - A lock is poisoned
    /// - Logging cannot be initialized
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for watchbot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returns the current Unix time in fractional seconds.
///
/// Falls back to `0.0` if the system clock is before the Unix epoch.
///
/// ```rust
/// let now = watchbot::current_time();
/// assert!(now > 0.0);
/// ```
#[must_use]
pub fn current_time() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
