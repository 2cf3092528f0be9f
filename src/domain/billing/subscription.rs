//! Subscription aggregate entity.
//!
//! The Subscription aggregate is the locally durable mirror of exactly one
//! external subscription. Each user has at most one Subscription row.
//!
//! # Design Decisions
//!
//! - **One per user**: unique constraint on `user_id` enforced at the
//!   database level
//! - **One per external id**: unique constraint on `stripe_id`; the external
//!   id is the provider's stable key across its own retries
//! - **Reconciler-only writes**: rows are created and mutated only by the
//!   reconciler, never directly from client input
//! - **No hard deletes**: cancellation and expiry are status transitions

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{SubscriptionId, Timestamp, UserId};

use super::SubscriptionStatus;

/// Locally durable mirror of one external subscription.
///
/// # Invariants
///
/// - `id` is globally unique
/// - `user_id` is unique (one subscription per user)
/// - `stripe_id` is unique (one row per external subscription)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Unique identifier for this row.
    pub id: SubscriptionId,

    /// User who owns this subscription.
    pub user_id: UserId,

    /// The external provider's subscription identifier.
    pub stripe_id: String,

    /// Current status as last reconciled from the provider.
    pub status: SubscriptionStatus,

    /// Start of the current billing period.
    pub current_period_start: Option<Timestamp>,

    /// End of the current billing period.
    pub current_period_end: Option<Timestamp>,

    /// When the row was created.
    pub created_at: Timestamp,

    /// When the row was last reconciled.
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Creates a subscription row from a provider snapshot.
    ///
    /// Used by the reconciler when a checkout completes for a user with no
    /// prior row.
    pub fn from_snapshot(
        user_id: UserId,
        stripe_id: impl Into<String>,
        status: SubscriptionStatus,
        current_period_start: Option<Timestamp>,
        current_period_end: Option<Timestamp>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: SubscriptionId::new(),
            user_id,
            stripe_id: stripe_id.into(),
            status,
            current_period_start,
            current_period_end,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true while the subscription grants premium access on its own,
    /// i.e. it is active and its billing period has not ended at `now`.
    pub fn grants_access_at(&self, now: Timestamp) -> bool {
        self.status == SubscriptionStatus::Active
            && self
                .current_period_end
                .map(|end| end.is_after(&now))
                .unwrap_or(false)
    }
}
