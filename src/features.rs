//! Optional middleware features.

use serde::{Deserialize, Serialize};

/// Optional capabilities an adapter may advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddlewareFeature {
    /// Message info carries the publisher-side sequence number.
    MessageInfoPublicationSequenceNumber,
    /// Message info carries the subscription-side sequence number.
    MessageInfoReceptionSequenceNumber,
}

/// Whether this adapter provides `feature`.
#[must_use]
pub const fn feature_supported(feature: MiddlewareFeature) -> bool {
    matches!(feature, MiddlewareFeature::MessageInfoPublicationSequenceNumber)
}
