//! The `watch` chat command.
//!
//! ```text
//! watch                                   show settings and keywords
//! watch add <keyword> [match-case] [whole-word]
//! watch delete <n> | all
//! watch on | off
//! watch activityTimeout <seconds>
//! watch suppress <seconds>
//! ```

use crate::models::{Keyword, UserId, WatchStatus};
use crate::services::WatchService;
use crate::util::CaseInsensitiveMap;
use crate::{Error, Result};
use std::fmt::Write as _;
use std::sync::OnceLock;

const USAGE_HINT: &str = "See `help watch` for help.";

/// A parsed `watch` command.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchCommand {
    /// Show the user's settings.
    Show,
    /// Add a keyword.
    Add {
        /// Keyword text as typed.
        keyword: String,
        /// Require an exact case match.
        match_case: bool,
        /// Require word boundaries on both sides.
        whole_word: bool,
    },
    /// Delete one or all keywords.
    Delete(DeleteTarget),
    /// Turn notifications on (`true`) or off.
    Toggle(bool),
    /// Set the activity timeout in seconds.
    ActivityTimeout(f64),
    /// Suppress notifications for a number of seconds.
    Suppress(f64),
}

/// What `watch delete` removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteTarget {
    /// A 1-based keyword number.
    Index(usize),
    /// Every keyword.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subcommand {
    Add,
    Delete,
    On,
    Off,
    ActivityTimeout,
    Suppress,
}

fn subcommands() -> &'static CaseInsensitiveMap<Subcommand> {
    static SUBCOMMANDS: OnceLock<CaseInsensitiveMap<Subcommand>> = OnceLock::new();
    SUBCOMMANDS.get_or_init(|| {
        [
            ("add", Subcommand::Add),
            ("delete", Subcommand::Delete),
            ("on", Subcommand::On),
            ("off", Subcommand::Off),
            ("activityTimeout", Subcommand::ActivityTimeout),
            ("suppress", Subcommand::Suppress),
        ]
        .into_iter()
        .collect()
    })
}

impl WatchCommand {
    /// Parses the text after `watch`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for unknown sub-commands, wrong argument
    /// counts, bad flags or numbers, and unterminated quotes.
    pub fn parse(input: &str) -> Result<Self> {
        let args = split_args(input)?;
        Self::from_args(&args)
    }

    /// Builds a command from already split arguments.
    ///
    /// # Errors
    ///
    /// See [`WatchCommand::parse`].
    pub fn from_args(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Self::Show);
        };
        let subcommand = subcommands().get(name).copied().ok_or_else(|| {
            Error::InvalidInput(format!("Invalid sub-command '{name}'. {USAGE_HINT}"))
        })?;

        match subcommand {
            Subcommand::Add => {
                let [keyword, flags @ ..] = rest else {
                    return Err(wrong_arg_count());
                };
                if flags.len() > 2 {
                    return Err(wrong_arg_count());
                }
                let match_case = flags
                    .first()
                    .map(|f| parse_flag(f, "match case"))
                    .transpose()?
                    .unwrap_or(false);
                let whole_word = flags
                    .get(1)
                    .map(|f| parse_flag(f, "whole word"))
                    .transpose()?
                    .unwrap_or(false);
                Ok(Self::Add {
                    keyword: keyword.clone(),
                    match_case,
                    whole_word,
                })
            },
            Subcommand::Delete => {
                let [target] = rest else {
                    return Err(wrong_arg_count());
                };
                if target.eq_ignore_ascii_case("all") {
                    return Ok(Self::Delete(DeleteTarget::All));
                }
                target
                    .trim()
                    .parse::<usize>()
                    .map(|n| Self::Delete(DeleteTarget::Index(n)))
                    .map_err(|_| Error::InvalidInput(format!("Invalid number '{target}'.")))
            },
            Subcommand::On | Subcommand::Off => {
                if !rest.is_empty() {
                    return Err(wrong_arg_count());
                }
                Ok(Self::Toggle(subcommand == Subcommand::On))
            },
            Subcommand::ActivityTimeout => {
                let [seconds] = rest else {
                    return Err(wrong_arg_count());
                };
                parse_seconds(seconds).map(Self::ActivityTimeout)
            },
            Subcommand::Suppress => {
                let [seconds] = rest else {
                    return Err(wrong_arg_count());
                };
                parse_seconds(seconds).map(Self::Suppress)
            },
        }
    }

    /// Runs the command for `user` and returns the reply text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyKeyword`] or [`Error::IndexOutOfRange`] for
    /// rejected changes, or an error if the watches cannot be saved.
    pub fn execute(&self, service: &WatchService, user: UserId, now: f64) -> Result<String> {
        match self {
            Self::Show => Ok(render_status(service.status(user, now)?.as_ref())),
            Self::Add {
                keyword,
                match_case,
                whole_word,
            } => {
                let added = service.add_keyword(user, keyword, *match_case, *whole_word)?;
                let mut reply = format!(
                    "Added watch for keyword \"{}\" {}.",
                    added.text,
                    describe_flags(&added)
                );
                if service.status(user, now)?.is_some_and(|s| !s.enabled) {
                    reply.push_str(" Note: Your keyword watch notifications are currently off.");
                }
                Ok(reply)
            },
            Self::Delete(target) => {
                let has_keywords = service
                    .status(user, now)?
                    .is_some_and(|s| !s.keywords.is_empty());
                if !has_keywords {
                    return Ok("You have no watches configured.".to_string());
                }
                match target {
                    DeleteTarget::All => {
                        service.remove_all(user)?;
                        Ok("Cleared all your keyword watches.".to_string())
                    },
                    DeleteTarget::Index(index) => {
                        let removed = service.remove_keyword(user, *index)?;
                        Ok(format!(
                            "Removed watch #{index} for keyword \"{}\" {}.",
                            removed.text,
                            describe_flags(&removed)
                        ))
                    },
                }
            },
            Self::Toggle(on) => {
                service.set_enabled(user, *on)?;
                let state = if *on { "on" } else { "off" };
                Ok(format!("Turned keyword watch notifications **{state}**."))
            },
            Self::ActivityTimeout(seconds) => {
                service.set_activity_timeout(user, *seconds)?;
                if *seconds > 0.0 {
                    Ok(format!("Activity timeout has been set to {seconds} seconds."))
                } else {
                    Ok("Activity timeout has been disabled.".to_string())
                }
            },
            Self::Suppress(seconds) => {
                service.suppress_at(user, *seconds, now)?;
                Ok(format!("Keyword watches suppressed for {seconds} seconds."))
            },
        }
    }
}

/// Renders the reply to a bare `watch` command.
#[must_use]
pub fn render_status(status: Option<&WatchStatus>) -> String {
    let Some(status) = status else {
        return "You have not set up keyword watches.".to_string();
    };

    let state = if status.enabled { "on" } else { "off" };
    let mut out = format!("Your keyword watches notifications are turned **{state}**.");
    if let Some(remaining) = status.suppressed_for {
        let _ = write!(
            out,
            "\nNotifications are suppressed for the next **{remaining:.2}** seconds."
        );
    }
    if status.activity_timeout > 0.0 {
        let _ = write!(
            out,
            "\nYour activity timeout is set to {} seconds.\n\n",
            status.activity_timeout
        );
    } else {
        out.push_str("\nActivity timeout is disabled.\n\n");
    }

    if status.keywords.is_empty() {
        out.push_str("You do not have any keyword watches.");
    } else {
        out.push_str("Your keyword watches are:");
        for (i, keyword) in status.keywords.iter().enumerate() {
            let _ = write!(out, "\n{}. \"{}\" {}", i + 1, keyword.text, describe_flags(keyword));
        }
    }
    out
}

/// Flag summary shown in replies, with capitalized booleans.
fn describe_flags(keyword: &Keyword) -> String {
    format!(
        "(match case: {}, whole word: {})",
        bool_label(keyword.match_case),
        bool_label(keyword.whole_word)
    )
}

const fn bool_label(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}

/// Splits a command line into arguments, shell style.
///
/// Whitespace separates arguments. Single quotes keep their contents
/// literally; double quotes allow `\"` and `\\` escapes; a backslash outside
/// quotes escapes the next character. `""` yields an empty argument.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for an unterminated quote or a trailing
/// backslash.
pub fn split_args(input: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            },
            '\'' => {
                in_arg = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(syntax_error("No closing quotation")),
                    }
                }
            },
            '"' => {
                in_arg = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => current.push(c),
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            },
                            None => return Err(syntax_error("No closing quotation")),
                        },
                        Some(c) => current.push(c),
                        None => return Err(syntax_error("No closing quotation")),
                    }
                }
            },
            '\\' => {
                in_arg = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => return Err(syntax_error("No escaped character")),
                }
            },
            c => {
                in_arg = true;
                current.push(c);
            },
        }
    }

    if in_arg {
        args.push(current);
    }
    Ok(args)
}

fn syntax_error(detail: &str) -> Error {
    Error::InvalidInput(format!("Invalid syntax: {detail}"))
}

fn wrong_arg_count() -> Error {
    Error::InvalidInput(format!("Invalid number of arguments. {USAGE_HINT}"))
}

fn parse_flag(value: &str, option: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" => Ok(true),
        "false" | "no" => Ok(false),
        _ => Err(Error::InvalidInput(format!(
            "Invalid argument for {option} option. {USAGE_HINT}"
        ))),
    }
}

fn parse_seconds(value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())
        .ok_or_else(|| Error::InvalidInput(format!("Invalid number '{value}'.")))
}
