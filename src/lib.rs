//! # dds-status - status events for pub/sub middleware adapters
//!
//! A transport reports status changes (deadline missed, liveliness lost,
//! incompatible QoS, ...) from its own threads. This crate aggregates them per
//! entity and hands them to consumers through polling, a blocking wait set
//! or a push callback, without missed wakeups or lock-order deadlocks.
//!
//! ## Core Concepts
//!
//! - **EventListener**: per-entity registers, dirty flags and notification
//!   channel
//! - **StatusSnapshot**: absolute total plus the change accumulated since the
//!   last take
//! - **WaitSet**: blocks until any watched (listener, kind) pair is dirty
//! - **Notification callback**: push delivery, with a backlog while none is
//!   registered
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use dds_status::{CountStatus, EntityRole, EventKind, EventListener, WaitSet};
//!
//! let listener = Arc::new(EventListener::for_role(EntityRole::Publisher));
//! let mut wait_set = WaitSet::new();
//! wait_set.add(&listener, EventKind::OfferedDeadlineMissed).unwrap();
//!
//! // Transport thread
//! listener.on_offered_deadline_missed(CountStatus { total_count: 3, total_count_change: 3 });
//!
//! // Consumer thread
//! let ready = wait_set.wait(Some(Duration::from_secs(1))).unwrap();
//! assert!(ready.contains(0));
//! let status = listener.take_next_event(EventKind::OfferedDeadlineMissed).unwrap();
//! assert_eq!(status.total_count_change, 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod event;
pub mod features;
pub mod kind;
pub mod listener;
pub mod notify;
pub mod policy;
pub mod status;
pub mod wait;

mod sync;

// Re-export primary types at crate root for convenience
pub use error::{EventError, EventResult};
pub use event::EventHandle;
pub use features::{feature_supported, MiddlewareFeature};
pub use kind::{EntityRole, EventKind, SupportedKinds};
pub use listener::{EventListener, ListenerConfig, ListenerId};
pub use notify::{EventCallback, NotificationChannel, Notice, NotificationStream};
pub use policy::{DdsPolicyTable, PolicyId, PolicyResolver, QosPolicyKind};
pub use status::{
    CountStatus, IncompatibleQosStatus, RegisterValues, StatusRegister, StatusSnapshot,
    StatusUpdate,
};
pub use wait::{ReadySet, WaitCoordinator, WaitSet};
