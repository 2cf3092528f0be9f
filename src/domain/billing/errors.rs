//! Billing error taxonomy.
//!
//! Covers the synchronous flows (checkout, cancellation, queries). Webhook
//! authentication failures have their own type in `webhook_errors`.

use thiserror::Error;

use crate::domain::foundation::{DomainError, UserId};

/// Errors surfaced by billing operations.
#[derive(Debug, Error)]
pub enum BillingError {
    /// The user has no subscription (or no matching record exists).
    #[error("No subscription found for user {0}")]
    NotFound(UserId),

    /// The referenced user record does not exist.
    #[error("User {0} not found")]
    UserNotFound(UserId),

    /// The external billing provider rejected or failed the call.
    ///
    /// Never silently swallowed on synchronous flows; the caller decides
    /// whether to retry.
    #[error("Payment provider error: {message}")]
    Provider { message: String, retryable: bool },

    /// A synchronous request body failed validation.
    #[error("Validation failed for '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    /// Storage or other infrastructure failure.
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl BillingError {
    /// Creates a provider error from a message.
    pub fn provider(message: impl Into<String>, retryable: bool) -> Self {
        BillingError::Provider {
            message: message.into(),
            retryable,
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        BillingError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        BillingError::Infrastructure(err.to_string())
    }
}
