//! Request and response DTOs for the billing endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::billing::Subscription;

/// Response for a started checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    /// Hosted checkout URL to redirect the user to.
    pub url: String,
}

/// Client-facing subscription representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub id: String,
    pub stripe_id: String,
    pub status: String,
    pub current_period_start: Option<String>,
    pub current_period_end: Option<String>,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            id: subscription.id.to_string(),
            stripe_id: subscription.stripe_id,
            status: subscription.status.as_str().to_string(),
            current_period_start: subscription.current_period_start.map(|t| t.to_string()),
            current_period_end: subscription.current_period_end.map(|t| t.to_string()),
        }
    }
}

/// Response for the subscription-status query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionStatusResponse {
    pub has_active_subscription: bool,
    pub is_admin: bool,
}

/// Acknowledgment body returned to the webhook caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAckResponse {
    pub status: String,
}

impl WebhookAckResponse {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
        }
    }
}

/// Error body for all billing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
