//! Subscription status state machine.

use serde::{Deserialize, Serialize};

/// Status of a locally mirrored subscription.
///
/// The external billing provider is the source of truth; this enum captures
/// the states the platform distinguishes. `Canceled` and `Expired` are
/// terminal for a given external subscription id; a user who resubscribes
/// gets a fresh external id reconciled into their row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Paid and current.
    Active,

    /// User or provider canceled the subscription.
    Canceled,

    /// Subscription lapsed without an explicit cancellation.
    Expired,
}

impl SubscriptionStatus {
    /// Maps a provider status string onto the local enum.
    ///
    /// Anything the platform does not model (`past_due`, `unpaid`,
    /// `incomplete_expired`, ...) maps to `Expired` so access fails closed.
    pub fn from_provider(s: &str) -> Self {
        match s {
            "active" => SubscriptionStatus::Active,
            "canceled" => SubscriptionStatus::Canceled,
            "expired" => SubscriptionStatus::Expired,
            other => {
                tracing::warn!(provider_status = other, "Unmapped provider subscription status");
                SubscriptionStatus::Expired
            }
        }
    }

    /// Parses the status from its storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SubscriptionStatus::Active),
            "canceled" => Some(SubscriptionStatus::Canceled),
            "expired" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }

    /// Returns the storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Expired => "expired",
        }
    }
}
