//! SubscriptionStatusHandler - Query for the client's entitlement banner.

use std::sync::Arc;

use crate::domain::billing::{has_premium_access, BillingError};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{SubscriptionRepository, UserRepository};

/// Entitlement summary returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionStatusResult {
    /// Whether the user's subscription currently grants access.
    pub has_active_subscription: bool,
    /// Whether the account has the admin role.
    pub is_admin: bool,
}

/// Handler answering the subscription-status query.
pub struct SubscriptionStatusHandler {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionStatusHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
    ) -> Self {
        Self {
            users,
            subscriptions,
        }
    }

    pub async fn handle(&self, user_id: UserId) -> Result<SubscriptionStatusResult, BillingError> {
        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or(BillingError::UserNotFound(user_id))?;

        let subscription = self.subscriptions.find_by_user_id(&user_id).await?;
        let now = Timestamp::now();

        Ok(SubscriptionStatusResult {
            has_active_subscription: subscription
                .as_ref()
                .map(|s| s.grants_access_at(now))
                .unwrap_or(false),
            is_admin: user.role.is_admin(),
        })
    }

    /// Premium gate for enforcement points such as review submission.
    ///
    /// Delegates to the single access-rule function.
    pub async fn has_premium_access(&self, user_id: UserId) -> Result<bool, BillingError> {
        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or(BillingError::UserNotFound(user_id))?;

        let subscription = self.subscriptions.find_by_user_id(&user_id).await?;

        Ok(has_premium_access(
            user.role,
            subscription.as_ref(),
            Timestamp::now(),
        ))
    }
}
