//! CancelSubscriptionHandler - Client-initiated cancellation.
//!
//! Local state never claims a cancellation the provider has not confirmed:
//! the external call happens first, and only its confirmed snapshot is
//! written back, through the same reconciler path the webhooks use.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Subscription};
use crate::domain::foundation::UserId;
use crate::ports::{PaymentProvider, SubscriptionRepository};

use super::reconciler::SubscriptionReconciler;

/// Handler for cancelling the caller's subscription.
pub struct CancelSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
    reconciler: Arc<SubscriptionReconciler>,
}

impl CancelSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
        reconciler: Arc<SubscriptionReconciler>,
    ) -> Self {
        Self {
            subscriptions,
            payment_provider,
            reconciler,
        }
    }

    /// Cancels the user's subscription and returns the updated record.
    ///
    /// # Errors
    ///
    /// - `NotFound` when the user has no subscription; no external call is
    ///   made
    /// - `Provider` when the external cancellation fails; the local record
    ///   is left untouched for the caller to retry
    pub async fn handle(&self, user_id: UserId) -> Result<Subscription, BillingError> {
        let subscription = self
            .subscriptions
            .find_by_user_id(&user_id)
            .await?
            .ok_or(BillingError::NotFound(user_id))?;

        let snapshot = self
            .payment_provider
            .cancel_subscription(&subscription.stripe_id)
            .await?;

        tracing::info!(
            user_id = %user_id,
            subscription_id = %subscription.stripe_id,
            "Provider confirmed cancellation"
        );

        self.reconciler.apply_provider_snapshot(&snapshot).await?;

        // Re-read so the caller sees exactly what reconciliation stored.
        self.subscriptions
            .find_by_user_id(&user_id)
            .await?
            .ok_or(BillingError::NotFound(user_id))
    }
}
