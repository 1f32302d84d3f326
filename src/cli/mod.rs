//! CLI command implementations.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `watch` | Run a `watch` chat command for a user against the watch file |
//! | `scan` | Replay chat messages and print the notifications they trigger |
//!
//! # Example Usage
//!
//! ```bash
//! # Add a case-sensitive, whole-word watch for user 42
//! watchbot watch --user 42 add CAD yes yes
//!
//! # Show user 42's settings
//! watchbot watch --user 42
//!
//! # Replay a message log
//! watchbot scan --input messages.jsonl --roster roster.json --format json
//! ```

mod scan;
mod watch;

pub use scan::{ScanOutputFormat, ScanSummary, cmd_scan, load_roster};
pub use watch::cmd_watch;

use crate::Error;

/// Maps an output error.
#[allow(clippy::needless_pass_by_value)]
fn write_error(e: std::io::Error) -> Error {
    Error::OperationFailed {
        operation: "write_output".to_string(),
        cause: e.to_string(),
    }
}
