//! Chat messages, presence and outgoing notifications.

use super::{ChatId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Kind of chat a message was sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    /// A forum or team with a member list.
    #[default]
    Group,
    /// A one-to-one conversation.
    Direct,
}

/// User presence as reported by the chat service.
///
/// Deserialization goes through [`Presence::parse`], so roster files may use
/// any casing and the `dnd`/`unavailable` spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Presence {
    /// Online and watching chats; no notifications needed.
    Available,
    /// Idle.
    Away,
    /// Do not disturb.
    DoNotDisturb,
    /// Not connected.
    Offline,
}

impl Presence {
    /// Parses a presence string, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "available" => Some(Self::Available),
            "away" => Some(Self::Away),
            "dnd" | "do_not_disturb" => Some(Self::DoNotDisturb),
            "offline" | "unavailable" => Some(Self::Offline),
            _ => None,
        }
    }
}

impl TryFrom<String> for Presence {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown presence: {value}"))
    }
}

/// An incoming chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message body. Missing or null text is treated as empty.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    /// Sender.
    pub author: UserId,
    /// Sender display name.
    #[serde(default)]
    pub author_name: String,
    /// Destination chat.
    pub chat: ChatId,
    /// Destination chat display name.
    #[serde(default)]
    pub chat_name: String,
    /// Group chat or direct message.
    #[serde(default)]
    pub kind: ChatKind,
    /// Unix time the message was received.
    #[serde(default = "crate::current_time")]
    pub timestamp: f64,
}

impl ChatMessage {
    /// Creates a group chat message stamped with the current time.
    #[must_use]
    pub fn group(text: impl Into<String>, author: UserId, chat: ChatId) -> Self {
        Self {
            text: text.into(),
            author,
            author_name: String::new(),
            chat,
            chat_name: String::new(),
            kind: ChatKind::Group,
            timestamp: crate::current_time(),
        }
    }

    /// Creates a direct message stamped with the current time.
    #[must_use]
    pub fn direct(text: impl Into<String>, author: UserId, chat: ChatId) -> Self {
        Self {
            kind: ChatKind::Direct,
            ..Self::group(text, author, chat)
        }
    }

    /// Sets the display names used when quoting the message.
    #[must_use]
    pub fn with_names(mut self, author_name: impl Into<String>, chat_name: impl Into<String>) -> Self {
        self.author_name = author_name.into();
        self.chat_name = chat_name.into();
        self
    }

    /// Sets the receive time.
    #[must_use]
    pub const fn at(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Author name, falling back to the numeric ID.
    #[must_use]
    pub fn author_label(&self) -> String {
        if self.author_name.is_empty() {
            self.author.to_string()
        } else {
            self.author_name.clone()
        }
    }

    /// Chat name, falling back to the numeric ID.
    #[must_use]
    pub fn chat_label(&self) -> String {
        if self.chat_name.is_empty() {
            self.chat.to_string()
        } else {
            self.chat_name.clone()
        }
    }
}

/// The quoted copy of a message included in a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotedMessage {
    /// Display name of the author.
    pub author: String,
    /// Display name of the chat.
    pub chat: String,
    /// Original message body.
    pub text: String,
}

impl QuotedMessage {
    /// Quotes `message`.
    #[must_use]
    pub fn from_message(message: &ChatMessage) -> Self {
        Self {
            author: message.author_label(),
            chat: message.chat_label(),
            text: message.text.clone(),
        }
    }

    /// Renders the quote as chat markdown.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("> *{}* said in *{}*:", self.author, self.chat);
        for line in self.text.lines() {
            let _ = write!(out, "\n> {line}");
        }
        out
    }
}

/// A keyword-watch notification for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// The user to notify by direct message.
    pub recipient: UserId,
    /// Matched keywords, deduplicated, in first-match order.
    pub keywords: Vec<String>,
    /// The message that matched.
    pub quote: QuotedMessage,
}

impl Notification {
    /// Renders the direct message body.
    #[must_use]
    pub fn render(&self) -> String {
        let keywords = self
            .keywords
            .iter()
            .map(|k| format!("\"**{k}**\""))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "The following message matched your watches for the keyword(s) {keywords}:\n{}",
            self.quote.render()
        )
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_render() {
        let message = ChatMessage::group("line one\nline two", UserId::new(1), ChatId::new(2))
            .with_names("Alice", "General");
        let notification = Notification {
            recipient: UserId::new(3),
            keywords: vec!["rust".to_string(), "CAD".to_string()],
            quote: QuotedMessage::from_message(&message),
        };

        assert_eq!(
            notification.render(),
            "The following message matched your watches for the keyword(s) \"**rust**\", \"**CAD**\":\n\
             > *Alice* said in *General*:\n> line one\n> line two"
        );
    }

    #[test]
    fn test_labels_fall_back_to_ids() {
        let message = ChatMessage::direct("hi", UserId::new(5), ChatId::new(6));
        assert_eq!(message.kind, ChatKind::Direct);
        assert_eq!(message.author_label(), "5");
        assert_eq!(message.chat_label(), "6");
    }

    #[test]
    fn test_message_deserialize_defaults() {
        let message: ChatMessage =
            serde_json::from_str(r#"{"author": 1, "chat": 2, "timestamp": 5.0}"#).unwrap();
        assert_eq!(message.text, "");
        assert_eq!(message.kind, ChatKind::Group);
        assert!((message.timestamp - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_message_null_text_is_empty() {
        let message: ChatMessage =
            serde_json::from_str(r#"{"text": null, "author": 1, "chat": 2}"#).unwrap();
        assert_eq!(message.text, "");
    }

    #[test]
    fn test_presence_deserialize_accepts_aliases() {
        let presence: Vec<Presence> =
            serde_json::from_str(r#"["Available", "dnd", "do_not_disturb", "unavailable"]"#)
                .unwrap();
        assert_eq!(
            presence,
            vec![
                Presence::Available,
                Presence::DoNotDisturb,
                Presence::DoNotDisturb,
                Presence::Offline
            ]
        );
        assert!(serde_json::from_str::<Presence>(r#""busy""#).is_err());
        assert_eq!(
            serde_json::to_string(&Presence::DoNotDisturb).unwrap(),
            r#""do_not_disturb""#
        );
    }

    #[test]
    fn test_presence_parse() {
        assert_eq!(Presence::parse("Available"), Some(Presence::Available));
        assert_eq!(Presence::parse("dnd"), Some(Presence::DoNotDisturb));
        assert_eq!(Presence::parse("busy"), None);
    }
}
