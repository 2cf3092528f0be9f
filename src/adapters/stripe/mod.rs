//! Stripe adapter - implements the payment provider port.

mod stripe_adapter;
mod wire;

pub use stripe_adapter::{StripeConfig, StripePaymentAdapter};
pub use wire::{StripeCheckoutSession, StripeCustomer, StripeSubscription};
