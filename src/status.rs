//! Per-kind status registers and the snapshots handed to consumers.

use serde::{Deserialize, Serialize};

use crate::kind::EventKind;
use crate::policy::{PolicyId, QosPolicyKind};

/// A single status change as reported by the transport.
///
/// `absolute` is the transport's cumulative total and is expected never to
/// regress or wrap for a given kind. That is an external invariant: it is
/// not checked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusUpdate {
    /// Cumulative total, overwritten on every update.
    pub absolute: i64,
    /// Change since the previous transport callback, accumulated until taken.
    pub delta: i64,
    /// Last offending policy, for incompatible-QoS kinds.
    pub last_policy: Option<PolicyId>,
}

impl StatusUpdate {
    /// Counter-only update.
    #[must_use]
    pub const fn counts(absolute: i64, delta: i64) -> Self {
        Self {
            absolute,
            delta,
            last_policy: None,
        }
    }

    /// Update carrying the last offending policy.
    #[must_use]
    pub const fn with_policy(absolute: i64, delta: i64, policy: PolicyId) -> Self {
        Self {
            absolute,
            delta,
            last_policy: Some(policy),
        }
    }
}

/// Transport status shape shared by deadline, liveliness-lost and
/// message-lost callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountStatus {
    /// Cumulative count since the entity was created.
    pub total_count: i64,
    /// Change since the transport last reported this status.
    pub total_count_change: i64,
}

impl From<CountStatus> for StatusUpdate {
    fn from(status: CountStatus) -> Self {
        Self::counts(status.total_count, status.total_count_change)
    }
}

/// Transport status for incompatible-QoS callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub struct IncompatibleQosStatus {
    pub total_count: i64,
    pub total_count_change: i64,
    pub last_policy_id: PolicyId,
}

impl From<IncompatibleQosStatus> for StatusUpdate {
    fn from(status: IncompatibleQosStatus) -> Self {
        Self::with_policy(status.total_count, status.total_count_change, status.last_policy_id)
    }
}

/// Values read out of a register by [`StatusRegister::take`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterValues {
    /// Latest absolute count.
    pub total_count: i64,
    /// Change accumulated since the previous take.
    pub total_count_change: i64,
    /// Last offending policy ever reported, if any.
    pub last_policy: Option<PolicyId>,
}

/// Absolute and delta counters for one event kind.
///
/// No synchronization of its own; the listener keeps each register behind
/// that kind's lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusRegister {
    total_count: i64,
    total_count_change: i64,
    last_policy: Option<PolicyId>,
}

impl StatusRegister {
    /// Register with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total_count: 0,
            total_count_change: 0,
            last_policy: None,
        }
    }

    /// Overwrite the absolute count and policy, accumulate the delta.
    pub fn update(&mut self, update: StatusUpdate) {
        self.total_count = update.absolute;
        self.total_count_change = self.total_count_change.wrapping_add(update.delta);
        if let Some(policy) = update.last_policy {
            self.last_policy = Some(policy);
        }
    }

    /// Read the current values and reset the accumulated delta.
    pub fn take(&mut self) -> RegisterValues {
        let values = self.peek();
        self.total_count_change = 0;
        values
    }

    /// Read the current values without resetting anything.
    #[must_use]
    pub const fn peek(&self) -> RegisterValues {
        RegisterValues {
            total_count: self.total_count,
            total_count_change: self.total_count_change,
            last_policy: self.last_policy,
        }
    }
}

/// Status handed to a consumer by a successful take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Kind this snapshot was taken from.
    pub kind: EventKind,
    /// Absolute count at the time of the take.
    pub total_count: i64,
    /// Change since the previous take of the same kind.
    pub total_count_change: i64,
    /// Resolved last offending policy; only set for incompatible-QoS kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_policy_kind: Option<QosPolicyKind>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_overwrites_absolute_and_sums_delta() {
        let mut reg = StatusRegister::new();
        reg.update(StatusUpdate::counts(5, 2));
        reg.update(StatusUpdate::counts(7, 3));

        let v = reg.take();
        assert_eq!(v.total_count, 7);
        assert_eq!(v.total_count_change, 5);
    }

    #[test]
    fn take_resets_only_delta() {
        let mut reg = StatusRegister::new();
        reg.update(StatusUpdate::counts(5, 2));
        reg.update(StatusUpdate::counts(7, 3));
        let _ = reg.take();

        let again = reg.take();
        assert_eq!(again.total_count, 7);
        assert_eq!(again.total_count_change, 0);

        reg.update(StatusUpdate::counts(9, 1));
        let v = reg.take();
        assert_eq!((v.total_count, v.total_count_change), (9, 1));
    }

    #[test]
    fn policy_is_overwritten_not_cleared() {
        let mut reg = StatusRegister::new();
        reg.update(StatusUpdate::with_policy(1, 1, PolicyId(4)));
        reg.update(StatusUpdate::with_policy(2, 1, PolicyId(11)));
        assert_eq!(reg.peek().last_policy, Some(PolicyId(11)));

        // A counter-only update keeps the last known policy.
        reg.update(StatusUpdate::counts(3, 1));
        assert_eq!(reg.take().last_policy, Some(PolicyId(11)));
    }

    #[test]
    fn transport_status_conversions() {
        let u: StatusUpdate = CountStatus {
            total_count: 4,
            total_count_change: 1,
        }
        .into();
        assert_eq!(u, StatusUpdate::counts(4, 1));

        let u: StatusUpdate = IncompatibleQosStatus {
            total_count: 2,
            total_count_change: 2,
            last_policy_id: PolicyId(8),
        }
        .into();
        assert_eq!(u.last_policy, Some(PolicyId(8)));
    }

    #[test]
    fn snapshot_omits_absent_policy() {
        let snap = StatusSnapshot {
            kind: EventKind::LivelinessLost,
            total_count: 3,
            total_count_change: 1,
            last_policy_kind: None,
        };
        let json = serde_json::to_value(snap).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "kind": "liveliness_lost",
                "total_count": 3,
                "total_count_change": 1,
            })
        );
    }
}
