//! Chat command handlers.
//!
//! Each handler parses the argument string that followed the command name
//! in a chat message and produces the text of the bot's reply.

mod watch;

pub use watch::{DeleteTarget, WatchCommand, render_status, split_args};
