//! Business logic services.
//!
//! [`WatchRegistry`] holds per-user settings, [`NotificationRouter`] turns a
//! message into notifications and [`WatchService`] ties both to a store.

mod registry;
mod roster;
mod router;
mod watch;

pub use registry::WatchRegistry;
pub use roster::{InMemoryRoster, RosterSnapshot, UserInfo};
pub use router::{NotificationRouter, Roster, SkipReason, check_eligibility, verify_subscription};
pub use watch::WatchService;
