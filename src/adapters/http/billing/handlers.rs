//! HTTP handlers for the billing endpoints.
//!
//! These handlers connect axum routes to the application layer handlers.
//! The webhook handler is the one place with unusual response semantics:
//! once a delivery is authenticated and dispatched, it is acknowledged with
//! 200 even if reconciliation failed internally, so the provider does not
//! redeliver a payload that will keep failing for local reasons.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::application::handlers::billing::{
    CancelSubscriptionHandler, CheckoutConfig, EventDispatcher, GetSubscriptionHandler,
    StartCheckoutHandler, SubscriptionReconciler, SubscriptionStatusHandler,
};
use crate::domain::billing::{BillingError, WebhookVerifier};
use crate::ports::{PaymentProvider, SubscriptionRepository, UserRepository};

use super::super::middleware::RequireAuth;
use super::dto::{
    CheckoutResponse, ErrorResponse, SubscriptionResponse, SubscriptionStatusResponse,
    WebhookAckResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all billing dependencies.
///
/// Cloned per request; dependencies are Arc-wrapped for cheap sharing.
#[derive(Clone)]
pub struct BillingAppState {
    pub users: Arc<dyn UserRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub webhook_verifier: Arc<WebhookVerifier>,
    pub checkout: CheckoutConfig,
}

impl BillingAppState {
    pub fn start_checkout_handler(&self) -> StartCheckoutHandler {
        StartCheckoutHandler::new(
            self.users.clone(),
            self.payment_provider.clone(),
            self.checkout.clone(),
        )
    }

    pub fn cancel_subscription_handler(&self) -> CancelSubscriptionHandler {
        CancelSubscriptionHandler::new(
            self.subscriptions.clone(),
            self.payment_provider.clone(),
            Arc::new(self.reconciler()),
        )
    }

    pub fn subscription_status_handler(&self) -> SubscriptionStatusHandler {
        SubscriptionStatusHandler::new(self.users.clone(), self.subscriptions.clone())
    }

    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.subscriptions.clone())
    }

    pub fn event_dispatcher(&self) -> EventDispatcher {
        EventDispatcher::new(Arc::new(self.reconciler()))
    }

    fn reconciler(&self) -> SubscriptionReconciler {
        SubscriptionReconciler::new(
            self.users.clone(),
            self.subscriptions.clone(),
            self.payment_provider.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Authenticated Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /checkout-sessions - Start the hosted checkout flow.
pub async fn create_checkout_session(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let url = state
        .start_checkout_handler()
        .handle(user.user_id)
        .await?;

    Ok(Json(CheckoutResponse { url }))
}

/// POST /subscriptions/cancel - Cancel the caller's subscription.
pub async fn cancel_subscription(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let subscription = state
        .cancel_subscription_handler()
        .handle(user.user_id)
        .await?;

    Ok(Json(SubscriptionResponse::from(subscription)))
}

/// GET /subscription-status - Entitlement summary for the caller.
pub async fn get_subscription_status(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let status = state
        .subscription_status_handler()
        .handle(user.user_id)
        .await?;

    Ok(Json(SubscriptionStatusResponse {
        has_active_subscription: status.has_active_subscription,
        is_admin: status.is_admin,
    }))
}

/// GET /subscriptions/current - The caller's subscription record.
pub async fn get_current_subscription(
    State(state): State<BillingAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, BillingApiError> {
    let subscription = state
        .get_subscription_handler()
        .handle(user.user_id)
        .await?
        .ok_or(BillingError::NotFound(user.user_id))?;

    Ok(Json(SubscriptionResponse::from(subscription)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Endpoint
// ════════════════════════════════════════════════════════════════════════════════

/// POST /billing/webhooks - Verify and dispatch a provider event.
///
/// Authentication failures map to one uniform 400 response regardless of
/// which check failed; the specific reason goes to logs only.
pub async fn handle_billing_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Webhook delivery without signature header");
        return webhook_rejection();
    };

    let event = match state.webhook_verifier.verify_and_parse(&body, signature) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Webhook authentication failed");
            return webhook_rejection();
        }
    };

    tracing::info!(event_id = %event.id, event_type = %event.event_type, "Webhook verified");

    // The delivery is acknowledged either way; a reconciliation failure is
    // an operator problem, not something redelivery can fix.
    match state.event_dispatcher().dispatch(&event).await {
        Ok(outcome) => {
            tracing::debug!(event_id = %event.id, ?outcome, "Webhook dispatched");
        }
        Err(e) => {
            tracing::error!(
                event_id = %event.id,
                event_type = %event.event_type,
                error = %e,
                "Reconciliation failed; acknowledging delivery anyway"
            );
        }
    }

    (StatusCode::OK, Json(WebhookAckResponse::success())).into_response()
}

fn webhook_rejection() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("Invalid webhook")),
    )
        .into_response()
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            BillingError::NotFound(_) => {
                (StatusCode::NOT_FOUND, "No subscription found".to_string())
            }
            BillingError::UserNotFound(_) => {
                (StatusCode::NOT_FOUND, "User not found".to_string())
            }
            BillingError::Provider { message, .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, message.clone())
            }
            BillingError::ValidationFailed { field, .. } => (
                StatusCode::BAD_REQUEST,
                format!("Invalid request: {}", field),
            ),
            BillingError::Infrastructure(detail) => {
                tracing::error!(error = %detail, "Billing request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
