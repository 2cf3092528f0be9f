//! Billing webhook event types.
//!
//! Defines the structures for parsing provider webhook payloads. Only fields
//! relevant to reconciliation are captured; everything else in the provider's
//! event schema is ignored.

use serde::{Deserialize, Serialize};

use super::webhook_errors::WebhookError;

/// Provider webhook event envelope (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: BillingEventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,

    /// API version used to render this event.
    #[serde(default)]
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

/// Checkout session object as delivered in `checkout.session.completed`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckoutSessionObject {
    /// Session identifier (cs_xxx).
    pub id: String,

    /// Payment mode (payment, setup, subscription).
    pub mode: String,

    /// External customer id attached to the session.
    pub customer: Option<String>,

    /// Subscription id created by the session, if mode is subscription.
    pub subscription: Option<String>,
}

/// Subscription object as delivered in `customer.subscription.*` events.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscriptionObject {
    /// Subscription identifier (sub_xxx).
    pub id: String,

    /// External customer id that owns the subscription.
    pub customer: String,

    /// Provider status string.
    pub status: String,

    /// Current billing period start (Unix timestamp).
    pub current_period_start: Option<i64>,

    /// Current billing period end (Unix timestamp).
    pub current_period_end: Option<i64>,
}

/// Event payload decoded by type tag.
///
/// Known event types carry a typed payload; everything else falls into
/// `Unknown` for forward compatibility.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// `checkout.session.completed`
    CheckoutCompleted(CheckoutSessionObject),
    /// `customer.subscription.updated`
    SubscriptionUpdated(SubscriptionObject),
    /// `customer.subscription.deleted`
    SubscriptionDeleted(SubscriptionObject),
    /// Any other event type.
    Unknown { event_type: String },
}

impl BillingEvent {
    /// Decodes the opaque data object into a typed payload based on the
    /// event type tag.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` if a known event type carries a
    /// payload that does not match its expected shape.
    pub fn payload(&self) -> Result<EventPayload, WebhookError> {
        match self.event_type.as_str() {
            "checkout.session.completed" => {
                let session: CheckoutSessionObject = self.deserialize_object()?;
                Ok(EventPayload::CheckoutCompleted(session))
            }
            "customer.subscription.updated" => {
                let subscription: SubscriptionObject = self.deserialize_object()?;
                Ok(EventPayload::SubscriptionUpdated(subscription))
            }
            "customer.subscription.deleted" => {
                let subscription: SubscriptionObject = self.deserialize_object()?;
                Ok(EventPayload::SubscriptionDeleted(subscription))
            }
            other => Ok(EventPayload::Unknown {
                event_type: other.to_string(),
            }),
        }
    }

    fn deserialize_object<T: serde::de::DeserializeOwned>(&self) -> Result<T, WebhookError> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| WebhookError::ParseError(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) fn test_event(event_type: &str, object: serde_json::Value) -> BillingEvent {
    BillingEvent {
        id: "evt_test_123".to_string(),
        event_type: event_type.to_string(),
        created: 1704067200,
        data: BillingEventData { object },
        livemode: false,
        api_version: Some("2023-10-16".to_string()),
    }
}
