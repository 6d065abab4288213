//! Notification delivery for status events.
//!
//! Every status update produces exactly one notification. With a callback
//! registered it is pushed immediately; otherwise it is counted in a backlog
//! that the next registered callback receives in one call.

/// Callback slot and backlog.
pub mod channel;
/// Bounded pull-style adapter over the push callback.
pub mod stream;

pub use channel::{EventCallback, NotificationChannel};
pub use stream::{Notice, NotificationStream};
