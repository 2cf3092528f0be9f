//! HTTP adapter for the billing endpoints.
//!
//! Exposes the billing core via REST:
//! - `POST /api/v1/checkout-sessions` - start the hosted checkout flow
//! - `POST /api/v1/subscriptions/cancel` - cancel the caller's subscription
//! - `GET /api/v1/subscriptions/current` - current subscription record
//! - `GET /api/v1/subscription-status` - entitlement summary
//! - `POST /api/v1/billing/webhooks` - provider webhook intake

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::BillingAppState;
pub use routes::billing_routes;
