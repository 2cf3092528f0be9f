//! SubscriptionReconciler - the subscription state machine.
//!
//! The single code path that ever writes subscription state. Webhook events
//! and the cancellation coordinator both funnel through here, so local rows
//! can only ever contain provider-confirmed snapshots.
//!
//! Every operation is idempotent by construction: writes are whole-snapshot
//! overwrites keyed on the provider's subscription id (or the user id when
//! leaving the no-row state), so replaying any event any number of times
//! produces the same end state. No ordering is assumed across event types;
//! last write observed by storage wins.

use std::sync::Arc;

use crate::domain::billing::{
    BillingError, CheckoutSessionObject, Subscription, SubscriptionObject, SubscriptionStatus,
};
use crate::domain::foundation::Timestamp;
use crate::ports::{PaymentProvider, SubscriptionRepository, SubscriptionSnapshot, UserRepository};

/// What a reconciliation operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A row was written.
    Applied,
    /// No local row matched the external id; logged and dropped.
    NoMatchingRow,
    /// The event did not apply (wrong mode, unknown user, missing fields).
    Skipped,
}

/// Reconciles local subscription rows against external snapshots.
pub struct SubscriptionReconciler {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl SubscriptionReconciler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            payment_provider,
        }
    }

    /// Activates a subscription from a completed checkout session.
    ///
    /// Resolves the user through the session's customer id, fetches the
    /// authoritative subscription snapshot from the provider, and upserts
    /// the user's row. Fails closed when the user cannot be resolved: an
    /// unmatched customer id indicates a provisioning race or data
    /// corruption, and must never create an orphaned subscription.
    pub async fn activate_from_checkout(
        &self,
        session: &CheckoutSessionObject,
    ) -> Result<ReconcileOutcome, BillingError> {
        if session.mode != "subscription" {
            tracing::info!(session_id = %session.id, mode = %session.mode, "Ignoring non-subscription checkout");
            return Ok(ReconcileOutcome::Skipped);
        }

        let Some(customer_id) = session.customer.as_deref() else {
            tracing::warn!(session_id = %session.id, "Checkout session has no customer id");
            return Ok(ReconcileOutcome::Skipped);
        };

        let Some(user) = self.users.find_by_stripe_customer_id(customer_id).await? else {
            tracing::warn!(
                session_id = %session.id,
                customer_id = %customer_id,
                "No user for checkout customer; dropping event"
            );
            return Ok(ReconcileOutcome::Skipped);
        };

        let Some(subscription_id) = session.subscription.as_deref() else {
            tracing::warn!(session_id = %session.id, "Checkout session has no subscription id");
            return Ok(ReconcileOutcome::Skipped);
        };

        let Some(snapshot) = self.payment_provider.get_subscription(subscription_id).await? else {
            tracing::warn!(
                subscription_id = %subscription_id,
                "Provider has no subscription for completed checkout"
            );
            return Ok(ReconcileOutcome::Skipped);
        };

        let subscription = Subscription::from_snapshot(
            user.id,
            &snapshot.id,
            SubscriptionStatus::from_provider(&snapshot.status),
            snapshot.current_period_start.and_then(Timestamp::from_unix),
            snapshot.current_period_end.and_then(Timestamp::from_unix),
        );

        self.subscriptions.upsert_for_user(&subscription).await?;

        tracing::info!(
            user_id = %user.id,
            subscription_id = %snapshot.id,
            status = %subscription.status.as_str(),
            "Subscription activated from checkout"
        );
        Ok(ReconcileOutcome::Applied)
    }

    /// Overwrites the local row with a webhook subscription snapshot.
    ///
    /// Missing rows are a known race window: the `updated` event can run
    /// ahead of checkout activation. That delivery is dropped after a warn
    /// log; the provider's later redeliveries and the activation fetch keep
    /// the states converging.
    pub async fn upsert_from_snapshot(
        &self,
        subscription: &SubscriptionObject,
    ) -> Result<ReconcileOutcome, BillingError> {
        let matched = self
            .subscriptions
            .overwrite_by_stripe_id(
                &subscription.id,
                SubscriptionStatus::from_provider(&subscription.status),
                subscription
                    .current_period_start
                    .and_then(Timestamp::from_unix),
                subscription
                    .current_period_end
                    .and_then(Timestamp::from_unix),
            )
            .await?;

        if matched {
            tracing::info!(
                subscription_id = %subscription.id,
                status = %subscription.status,
                "Subscription reconciled from snapshot"
            );
            Ok(ReconcileOutcome::Applied)
        } else {
            tracing::warn!(
                subscription_id = %subscription.id,
                "Update for unknown subscription; possible event/activation race"
            );
            Ok(ReconcileOutcome::NoMatchingRow)
        }
    }

    /// Marks the local row canceled in response to a deletion event.
    pub async fn mark_canceled(
        &self,
        subscription: &SubscriptionObject,
    ) -> Result<ReconcileOutcome, BillingError> {
        let matched = self
            .subscriptions
            .set_status_by_stripe_id(&subscription.id, SubscriptionStatus::Canceled)
            .await?;

        if matched {
            tracing::info!(subscription_id = %subscription.id, "Subscription marked canceled");
            Ok(ReconcileOutcome::Applied)
        } else {
            tracing::warn!(
                subscription_id = %subscription.id,
                "Deletion for unknown subscription; dropping event"
            );
            Ok(ReconcileOutcome::NoMatchingRow)
        }
    }

    /// Applies a provider snapshot obtained from a synchronous call, such as
    /// the confirmed result of a cancellation request.
    ///
    /// Shares the overwrite path with webhook reconciliation so there is
    /// exactly one way subscription state gets written.
    pub async fn apply_provider_snapshot(
        &self,
        snapshot: &SubscriptionSnapshot,
    ) -> Result<ReconcileOutcome, BillingError> {
        self.upsert_from_snapshot(&SubscriptionObject {
            id: snapshot.id.clone(),
            customer: snapshot.customer_id.clone(),
            status: snapshot.status.clone(),
            current_period_start: snapshot.current_period_start,
            current_period_end: snapshot.current_period_end,
        })
        .await
    }
}
