//! Axum router configuration for the billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_subscription, create_checkout_session, get_current_subscription,
    get_subscription_status, handle_billing_webhook, BillingAppState,
};

/// Create the billing API router.
///
/// # Routes
///
/// ## User endpoints (require authentication)
/// - `POST /checkout-sessions` - start the hosted checkout flow
/// - `POST /subscriptions/cancel` - cancel the caller's subscription
/// - `GET /subscription-status` - entitlement summary
/// - `GET /subscriptions/current` - the caller's subscription record
///
/// ## Webhook endpoint (no session auth, signature verified)
/// - `POST /billing/webhooks` - verify and dispatch provider events
pub fn billing_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/checkout-sessions", post(create_checkout_session))
        .route("/subscriptions/cancel", post(cancel_subscription))
        .route("/subscriptions/current", get(get_current_subscription))
        .route("/subscription-status", get(get_subscription_status))
        .route("/billing/webhooks", post(handle_billing_webhook))
}
