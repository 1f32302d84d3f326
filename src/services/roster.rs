//! In-memory presence, activity and membership tracking.

use super::router::Roster;
use crate::models::{ChatId, Presence, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Runtime information about one user.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UserInfo {
    /// Last presence reported by the chat service.
    pub presence: Option<Presence>,
    /// Unix time of the user's last message.
    pub last_activity: f64,
}

/// Tracks what the chat session has told us about users and chats.
///
/// Users that have never been seen pass the presence and activity checks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoster {
    users: HashMap<UserId, UserInfo>,
    members: HashMap<ChatId, BTreeSet<UserId>>,
}

impl InMemoryRoster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `user` sent a message at `timestamp`.
    pub fn record_activity(&mut self, user: UserId, timestamp: f64) {
        self.users.entry(user).or_default().last_activity = timestamp;
    }

    /// Records a presence change.
    pub fn set_presence(&mut self, user: UserId, presence: Presence) {
        self.users.entry(user).or_default().presence = Some(presence);
    }

    /// Adds `user` to the members of `chat`.
    pub fn add_member(&mut self, chat: ChatId, user: UserId) {
        self.members.entry(chat).or_default().insert(user);
    }

    /// Removes `user` from the members of `chat`.
    pub fn remove_member(&mut self, chat: ChatId, user: UserId) {
        if let Some(members) = self.members.get_mut(&chat) {
            members.remove(&user);
        }
    }

    /// Builds a roster from a serialized snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: RosterSnapshot) -> Self {
        let mut roster = Self::new();
        for (user, presence) in snapshot.presence {
            roster.set_presence(user, presence);
        }
        for (chat, members) in snapshot.members {
            for user in members {
                roster.add_member(chat, user);
            }
        }
        roster
    }
}

impl Roster for InMemoryRoster {
    fn presence(&self, user: UserId) -> Option<Presence> {
        self.users.get(&user).and_then(|info| info.presence)
    }

    fn last_activity(&self, user: UserId) -> Option<f64> {
        self.users.get(&user).map(|info| info.last_activity)
    }

    fn is_member(&self, chat: ChatId, user: UserId) -> bool {
        self.members
            .get(&chat)
            .is_some_and(|members| members.contains(&user))
    }
}

/// Serializable roster seed, used by the `scan` command.
///
/// ```json
/// {"presence": {"2": "away"}, "members": {"100": [1, 2]}}
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterSnapshot {
    /// Presence per user.
    #[serde(default)]
    pub presence: BTreeMap<UserId, Presence>,
    /// Members per group chat.
    #[serde(default)]
    pub members: BTreeMap<ChatId, Vec<UserId>>,
}
