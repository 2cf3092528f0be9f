//! GetSubscriptionHandler - Query for the caller's subscription record.

use std::sync::Arc;

use crate::domain::billing::{BillingError, Subscription};
use crate::domain::foundation::UserId;
use crate::ports::SubscriptionRepository;

/// Handler returning the authenticated user's subscription, if any.
pub struct GetSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl GetSubscriptionHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    pub async fn handle(&self, user_id: UserId) -> Result<Option<Subscription>, BillingError> {
        Ok(self.subscriptions.find_by_user_id(&user_id).await?)
    }
}
