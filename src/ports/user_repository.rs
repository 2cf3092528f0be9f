//! User repository port.
//!
//! The billing core reads users and writes exactly one field: the external
//! customer identifier, set at most once.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::user::User;

/// Outcome of attempting to claim the customer id slot on a user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResult {
    /// This call set the customer id.
    Claimed,
    /// Another writer already set a customer id; the stored value wins.
    AlreadySet,
}

/// Port for user persistence as seen by billing.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Find the user owning the given external customer id.
    async fn find_by_stripe_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<User>, DomainError>;

    /// Set the external customer id if and only if none is stored yet.
    ///
    /// The conditional write is what makes provisioning idempotent under
    /// concurrent calls: exactly one writer claims the slot, everyone else
    /// observes `AlreadySet` and must re-read the stored value.
    async fn claim_stripe_customer_id(
        &self,
        user_id: &UserId,
        customer_id: &str,
    ) -> Result<ClaimResult, DomainError>;
}
