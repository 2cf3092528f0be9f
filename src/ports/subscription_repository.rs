//! Subscription repository port.
//!
//! Every write is a whole-snapshot overwrite executed as a single atomic
//! statement, so concurrent deliveries for the same row end up with one of
//! the delivered snapshots, never a mix of fields from both.

use async_trait::async_trait;

use crate::domain::billing::{Subscription, SubscriptionStatus};
use crate::domain::foundation::{DomainError, Timestamp, UserId};

/// Port for subscription persistence.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Find a user's subscription.
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError>;

    /// Find a subscription by the provider's subscription id.
    async fn find_by_stripe_id(&self, stripe_id: &str)
        -> Result<Option<Subscription>, DomainError>;

    /// Insert the subscription, or overwrite the user's existing row.
    ///
    /// Keyed on `user_id`: a user leaving the NONE state reuses their row,
    /// which is how the one-subscription-per-user constraint and a fresh
    /// external id coexist.
    async fn upsert_for_user(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Overwrite status and period fields for the row with this provider id.
    ///
    /// Returns false when no row matches (the caller treats that as a
    /// logged no-op, not an error).
    async fn overwrite_by_stripe_id(
        &self,
        stripe_id: &str,
        status: SubscriptionStatus,
        current_period_start: Option<Timestamp>,
        current_period_end: Option<Timestamp>,
    ) -> Result<bool, DomainError>;

    /// Set only the status for the row with this provider id.
    ///
    /// Returns false when no row matches.
    async fn set_status_by_stripe_id(
        &self,
        stripe_id: &str,
        status: SubscriptionStatus,
    ) -> Result<bool, DomainError>;
}
