//! Error types for dds-status.
//!
//! Expected outcomes on the listener hot path are plain `bool`/`Option`
//! returns. The typed errors below surface at the adapter-facing edges
//! (event handles, wait sets, notification streams) where callers need to
//! tell an unsupported kind from a timeout.

use thiserror::Error;

use crate::kind::EventKind;

/// Top-level error type for dds-status.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventError {
    /// The entity does not report this kind.
    #[error("Event kind {kind} is not supported by this entity")]
    UnsupportedKind {
        /// The rejected kind.
        kind: EventKind,
    },

    /// A blocking wait or receive gave up.
    #[error("Wait timed out after {duration_ms}ms")]
    Timeout {
        /// Time waited, zero for an immediate failure.
        duration_ms: u64,
    },

    /// The producing side of a notification stream is gone.
    #[error("Channel disconnected: {path}")]
    Disconnected {
        /// Which channel.
        path: String,
    },
}

impl EventError {
    /// Creates an unsupported-kind error.
    #[must_use]
    pub const fn unsupported(kind: EventKind) -> Self {
        Self::UnsupportedKind { kind }
    }

    /// Returns true if this is an unsupported-kind error.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedKind { .. })
    }

    /// Returns true if this is a timeout.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        // A different entity will not start supporting a kind on retry.
        matches!(self, Self::Timeout { .. })
    }
}

/// Result type alias for dds-status operations.
pub type EventResult<T> = Result<T, EventError>;
