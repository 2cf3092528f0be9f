//! EventDispatcher - routes verified webhook events to the reconciler.
//!
//! Unknown event types are never an error: the provider sends the full
//! event stream and this service only cares about three types.

use std::sync::Arc;

use crate::domain::billing::{BillingError, BillingEvent, EventPayload};

use super::reconciler::{ReconcileOutcome, SubscriptionReconciler};

/// Result of dispatching one verified event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The event reached a reconciliation handler.
    Reconciled(ReconcileOutcome),
    /// The event type is not handled; logged and dropped.
    Ignored,
}

/// Routes verified events to the correct reconciliation operation.
pub struct EventDispatcher {
    reconciler: Arc<SubscriptionReconciler>,
}

impl EventDispatcher {
    pub fn new(reconciler: Arc<SubscriptionReconciler>) -> Self {
        Self { reconciler }
    }

    /// Dispatches a verified event by its type tag.
    ///
    /// # Errors
    ///
    /// Returns an error only when a known event type carries a malformed
    /// payload or reconciliation itself fails. The HTTP boundary still acks
    /// the delivery in that case; the error exists for logging.
    pub async fn dispatch(&self, event: &BillingEvent) -> Result<DispatchOutcome, BillingError> {
        let payload = event
            .payload()
            .map_err(|e| BillingError::validation("data.object", e.to_string()))?;

        match payload {
            EventPayload::CheckoutCompleted(session) => {
                tracing::info!(event_id = %event.id, "Processing checkout.session.completed");
                let outcome = self.reconciler.activate_from_checkout(&session).await?;
                Ok(DispatchOutcome::Reconciled(outcome))
            }
            EventPayload::SubscriptionUpdated(subscription) => {
                tracing::info!(event_id = %event.id, "Processing customer.subscription.updated");
                let outcome = self.reconciler.upsert_from_snapshot(&subscription).await?;
                Ok(DispatchOutcome::Reconciled(outcome))
            }
            EventPayload::SubscriptionDeleted(subscription) => {
                tracing::info!(event_id = %event.id, "Processing customer.subscription.deleted");
                let outcome = self.reconciler.mark_canceled(&subscription).await?;
                Ok(DispatchOutcome::Reconciled(outcome))
            }
            EventPayload::Unknown { event_type } => {
                tracing::warn!(event_id = %event.id, event_type = %event_type, "Unhandled event type");
                Ok(DispatchOutcome::Ignored)
            }
        }
    }
}
