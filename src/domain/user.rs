//! User entity as seen by the billing core.
//!
//! Account creation and authentication belong to the identity tier; billing
//! only reads users and stamps the external customer identifier on them.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{UserId, UserRole};

/// A platform user.
///
/// Invariant: `stripe_customer_id` is set at most once and never changes
/// afterwards. The repository enforces this with a conditional write; see
/// `UserRepository::claim_stripe_customer_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,

    /// Email address, forwarded to the billing provider on provisioning.
    pub email: String,

    /// Display name.
    pub full_name: Option<String>,

    /// Account role.
    pub role: UserRole,

    /// External billing customer identifier, if provisioned.
    pub stripe_customer_id: Option<String>,
}

impl User {
    /// Returns true once a billing customer has been provisioned.
    pub fn is_provisioned(&self) -> bool {
        self.stripe_customer_id.is_some()
    }
}
