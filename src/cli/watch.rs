//! CLI command for managing a user's keyword watches.

use super::write_error;
use crate::Result;
use crate::commands::WatchCommand;
use crate::models::UserId;
use crate::services::WatchService;
use std::io::Write;

/// Runs `watch` with already split `args` for `user` and writes the reply.
///
/// # Errors
///
/// Returns an error if the arguments are invalid, the change is rejected,
/// the watches cannot be saved or the reply cannot be written.
pub fn cmd_watch<W: Write>(
    service: &WatchService,
    user: UserId,
    args: &[String],
    writer: &mut W,
) -> Result<()> {
    let command = WatchCommand::from_args(args)?;
    let reply = command.execute(service, user, crate::current_time())?;
    writeln!(writer, "{reply}").map_err(write_error)
}
