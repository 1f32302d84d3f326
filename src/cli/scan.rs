//! CLI command for replaying chat messages through the router.

use super::write_error;
use crate::models::{ChatMessage, Notification};
use crate::services::{InMemoryRoster, RosterSnapshot, WatchService};
use crate::{Error, Result};
use std::io::{BufRead, Write};
use std::path::Path;
use std::str::FromStr;

/// Output format for the scan command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanOutputFormat {
    /// Rendered notification text (default).
    #[default]
    Text,
    /// One JSON object per notification.
    Json,
}

impl FromStr for ScanOutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(Error::InvalidInput(format!("unknown output format: {other}"))),
        }
    }
}

/// Totals for one scan run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Messages routed.
    pub messages: usize,
    /// Notifications produced.
    pub notifications: usize,
    /// Input lines that were not valid messages.
    pub invalid_lines: usize,
}

/// Loads a roster seed from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_roster(path: &Path) -> Result<InMemoryRoster> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
        operation: "read_roster".to_string(),
        cause: format!("{}: {}", path.display(), e),
    })?;
    let snapshot: RosterSnapshot =
        serde_json::from_str(&contents).map_err(|e| Error::OperationFailed {
            operation: "parse_roster".to_string(),
            cause: e.to_string(),
        })?;
    Ok(InMemoryRoster::from_snapshot(snapshot))
}

/// Reads JSON-lines chat messages from `input`, routes each one and writes
/// the resulting notifications.
///
/// Every author's activity is recorded in `roster` before their message is
/// routed. Blank lines are ignored; malformed lines are logged and counted.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails.
pub fn cmd_scan<R: BufRead, W: Write>(
    service: &WatchService,
    roster: &mut InMemoryRoster,
    input: R,
    format: ScanOutputFormat,
    writer: &mut W,
) -> Result<ScanSummary> {
    let mut summary = ScanSummary::default();

    for (line_no, line) in input.lines().enumerate() {
        let line = line.map_err(|e| Error::OperationFailed {
            operation: "read_input".to_string(),
            cause: e.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let message: ChatMessage = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(line = line_no + 1, error = %e, "Skipping invalid message");
                summary.invalid_lines += 1;
                continue;
            },
        };

        roster.record_activity(message.author, message.timestamp);
        let notifications = service.on_message(&message, &*roster, message.timestamp)?;
        summary.messages += 1;
        summary.notifications += notifications.len();

        for notification in &notifications {
            write_notification(writer, notification, format)?;
        }
    }

    tracing::info!(
        messages = summary.messages,
        notifications = summary.notifications,
        invalid_lines = summary.invalid_lines,
        "Scan complete"
    );
    Ok(summary)
}

fn write_notification<W: Write>(
    writer: &mut W,
    notification: &Notification,
    format: ScanOutputFormat,
) -> Result<()> {
    match format {
        ScanOutputFormat::Text => writeln!(
            writer,
            "To {}:\n{}\n",
            notification.recipient,
            notification.render()
        )
        .map_err(write_error),
        ScanOutputFormat::Json => {
            let json = serde_json::to_string(notification).map_err(|e| Error::OperationFailed {
                operation: "serialize_notification".to_string(),
                cause: e.to_string(),
            })?;
            writeln!(writer, "{json}").map_err(write_error)
        },
    }
}
