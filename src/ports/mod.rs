//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `PaymentProvider` - external billing gateway (customers, checkout,
//!   subscription snapshots, cancellation)
//! - `UserRepository` - user lookups and the one-shot customer-id write
//! - `SubscriptionRepository` - atomic whole-snapshot subscription writes

mod payment_provider;
mod subscription_repository;
mod user_repository;

pub use payment_provider::{
    CheckoutSession, CreateCheckoutRequest, CreateCustomerRequest, Customer, PaymentError,
    PaymentErrorCode, PaymentProvider, SubscriptionSnapshot,
};
pub use subscription_repository::SubscriptionRepository;
pub use user_repository::{ClaimResult, UserRepository};
