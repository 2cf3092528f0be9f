//! Stripe API object types.
//!
//! These types represent Stripe objects as returned by its REST API. Only
//! fields the adapter consumes are captured; unknown fields are ignored.

use serde::{Deserialize, Serialize};

/// Stripe Customer object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCustomer {
    /// Unique customer identifier (cus_...).
    pub id: String,

    /// Customer email address.
    pub email: Option<String>,

    /// Set on customers that have been deleted.
    #[serde(default)]
    pub deleted: bool,
}

/// Stripe Checkout Session object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeCheckoutSession {
    /// Unique session identifier (cs_...).
    pub id: String,

    /// Hosted checkout URL for the customer.
    pub url: Option<String>,

    /// Customer attached to the session.
    pub customer: Option<String>,

    /// Subscription created by the session, if mode is subscription.
    pub subscription: Option<String>,

    /// Payment mode (payment, setup, subscription).
    pub mode: String,
}

/// Stripe Subscription object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscription {
    /// Unique subscription identifier (sub_...).
    pub id: String,

    /// Customer that owns the subscription.
    pub customer: String,

    /// Subscription status string.
    pub status: String,

    /// Current billing period start (Unix timestamp).
    pub current_period_start: Option<i64>,

    /// Current billing period end (Unix timestamp).
    pub current_period_end: Option<i64>,

    /// Whether the subscription cancels at period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,

    /// When cancellation was requested, if ever.
    pub canceled_at: Option<i64>,
}

/// Stripe error envelope (`{"error": {...}}`).
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorEnvelope {
    pub error: StripeApiError,
}

/// Error body returned by the Stripe API.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}
