//! Blocking wait-set integration.
//!
//! Listeners signal a shared [`WaitCoordinator`] whenever a dirty flag goes
//! up. [`WaitSet`] is the blocking side: it attaches its coordinator to the
//! listeners it watches, checks their dirty flags under the coordinator lock
//! and sleeps on the same lock.

/// Shared lock + condition variable.
pub mod coordinator;
/// Reference wait-set collaborator.
pub mod wait_set;

pub use coordinator::WaitCoordinator;
pub use wait_set::{ReadySet, WaitSet};
