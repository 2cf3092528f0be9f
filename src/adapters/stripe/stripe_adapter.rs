//! Stripe payment provider adapter.
//!
//! Implements the `PaymentProvider` port against the Stripe REST API.
//!
//! # Notes
//!
//! - The API key is held as `secrecy::SecretString` and never logged
//! - All requests share one `reqwest` client with a bounded timeout; no
//!   local locks are held across calls
//! - Checkout creation forwards the caller's idempotency key via the
//!   `Idempotency-Key` header so Stripe collapses duplicate submissions

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::ports::{
    CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest, Customer, PaymentError,
    PaymentProvider, SubscriptionSnapshot,
};

use super::wire::{StripeCheckoutSession, StripeCustomer, StripeErrorEnvelope, StripeSubscription};

/// Request timeout for all Stripe calls.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for the Stripe API.
    api_base_url: String,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Stripe implementation of the `PaymentProvider` port.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    /// Create a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("reqwest client construction cannot fail with static options");

        Self {
            config,
            http_client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Converts a non-success response into a `PaymentError`, preferring the
    /// message from Stripe's error envelope.
    async fn error_from_response(response: reqwest::Response) -> PaymentError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<StripeErrorEnvelope>(&body)
            .ok()
            .and_then(|e| e.error.message)
            .unwrap_or_else(|| format!("Stripe API error (HTTP {})", status.as_u16()));

        tracing::error!(status = status.as_u16(), error = %message, "Stripe API call failed");

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            PaymentError::new(crate::ports::PaymentErrorCode::RateLimitExceeded, message)
        } else if status == reqwest::StatusCode::UNAUTHORIZED {
            PaymentError::new(crate::ports::PaymentErrorCode::AuthenticationError, message)
        } else {
            PaymentError::provider(message)
        }
    }

    fn snapshot_from(sub: StripeSubscription) -> SubscriptionSnapshot {
        SubscriptionSnapshot {
            id: sub.id,
            customer_id: sub.customer,
            status: sub.status,
            current_period_start: sub.current_period_start,
            current_period_end: sub.current_period_end,
        }
    }
}

#[async_trait]
impl PaymentProvider for StripePaymentAdapter {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        let params = vec![
            ("email", request.email.clone()),
            ("metadata[user_id]", request.user_id.to_string()),
        ];

        let response = self
            .http_client
            .post(self.url("/v1/customers"))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let stripe_customer: StripeCustomer = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(Customer {
            id: stripe_customer.id,
            email: stripe_customer.email.or(Some(request.email)),
        })
    }

    async fn create_checkout_session(
        &self,
        request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let params = vec![
            ("customer", request.customer_id.clone()),
            ("mode", "subscription".to_string()),
            ("line_items[0][price]", request.price_id.clone()),
            ("line_items[0][quantity]", "1".to_string()),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
        ];

        let response = self
            .http_client
            .post(self.url("/v1/checkout/sessions"))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let session: StripeCheckoutSession = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        let url = session
            .url
            .unwrap_or_else(|| format!("https://checkout.stripe.com/c/pay/{}", session.id));

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, PaymentError> {
        let response = self
            .http_client
            .get(self.url(&format!("/v1/subscriptions/{}", subscription_id)))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let sub: StripeSubscription = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(Some(Self::snapshot_from(sub)))
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionSnapshot, PaymentError> {
        let response = self
            .http_client
            .delete(self.url(&format!("/v1/subscriptions/{}", subscription_id)))
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| PaymentError::network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let sub: StripeSubscription = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;

        Ok(Self::snapshot_from(sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_new_sets_default_base_url() {
        let config = StripeConfig::new("sk_test_key");
        assert_eq!(config.api_base_url, "https://api.stripe.com");
    }

    #[test]
    fn config_with_base_url_overrides() {
        let config = StripeConfig::new("sk_test_key").with_base_url("http://localhost:12111");
        assert_eq!(config.api_base_url, "http://localhost:12111");
    }

    #[test]
    fn adapter_builds_resource_urls() {
        let adapter = StripePaymentAdapter::new(
            StripeConfig::new("sk_test_key").with_base_url("http://localhost:12111"),
        );
        assert_eq!(
            adapter.url("/v1/subscriptions/sub_1"),
            "http://localhost:12111/v1/subscriptions/sub_1"
        );
    }

    #[test]
    fn snapshot_conversion_keeps_provider_fields() {
        let sub = StripeSubscription {
            id: "sub_1".to_string(),
            customer: "cus_1".to_string(),
            status: "active".to_string(),
            current_period_start: Some(1),
            current_period_end: Some(2),
            cancel_at_period_end: false,
            canceled_at: None,
        };

        let snapshot = StripePaymentAdapter::snapshot_from(sub);
        assert_eq!(snapshot.id, "sub_1");
        assert_eq!(snapshot.customer_id, "cus_1");
        assert_eq!(snapshot.status, "active");
        assert_eq!(snapshot.current_period_end, Some(2));
    }
}
