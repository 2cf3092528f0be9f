//! EnsureCustomerHandler - Idempotent billing customer provisioning.
//!
//! Maps one local user to exactly one external customer. Repeated calls are
//! side-effect-free after the first; a lost provisioning race defers to the
//! stored identifier.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::UserId;
use crate::ports::{ClaimResult, CreateCustomerRequest, PaymentProvider, UserRepository};

/// Handler that guarantees a user has an external billing customer.
pub struct EnsureCustomerHandler {
    users: Arc<dyn UserRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl EnsureCustomerHandler {
    pub fn new(users: Arc<dyn UserRepository>, payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self {
            users,
            payment_provider,
        }
    }

    /// Returns the user's external customer id, creating one if needed.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` when the user record does not exist
    /// - `Provider` when external creation fails; local state is untouched
    pub async fn handle(&self, user_id: UserId) -> Result<String, BillingError> {
        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or(BillingError::UserNotFound(user_id))?;

        // Idempotency guard: once set, the identifier never changes.
        if let Some(customer_id) = user.stripe_customer_id {
            return Ok(customer_id);
        }

        tracing::info!(user_id = %user_id, "Creating billing customer");

        let customer = self
            .payment_provider
            .create_customer(CreateCustomerRequest {
                user_id,
                email: user.email,
            })
            .await?;

        match self
            .users
            .claim_stripe_customer_id(&user_id, &customer.id)
            .await?
        {
            ClaimResult::Claimed => {
                tracing::info!(user_id = %user_id, customer_id = %customer.id, "Billing customer provisioned");
                Ok(customer.id)
            }
            ClaimResult::AlreadySet => {
                // A concurrent call won the slot; its identifier is the one
                // on record. The customer created here is orphaned on the
                // provider side and harmless.
                let stored = self
                    .users
                    .find_by_id(&user_id)
                    .await?
                    .and_then(|u| u.stripe_customer_id)
                    .ok_or_else(|| {
                        BillingError::Infrastructure(
                            "customer id claim lost but no stored value found".to_string(),
                        )
                    })?;

                tracing::warn!(
                    user_id = %user_id,
                    orphaned_customer_id = %customer.id,
                    "Lost provisioning race; using stored customer id"
                );
                Ok(stored)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainError, UserRole};
    use crate::domain::user::User;
    use crate::ports::{
        CheckoutSession, CreateCheckoutRequest, Customer, PaymentError, SubscriptionSnapshot,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct MockUserRepository {
        users: Mutex<Vec<User>>,
        // When set, claim attempts report AlreadySet and store this id.
        race_winner_id: Option<String>,
    }

    impl MockUserRepository {
        fn with_user(user: User) -> Self {
            Self {
                users: Mutex::new(vec![user]),
                race_winner_id: None,
            }
        }

        fn losing_race(user: User, winner_id: &str) -> Self {
            Self {
                users: Mutex::new(vec![user]),
                race_winner_id: Some(winner_id.to_string()),
            }
        }
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, DomainError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| &u.id == id)
                .cloned())
        }

        async fn find_by_stripe_customer_id(
            &self,
            customer_id: &str,
        ) -> Result<Option<User>, DomainError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.stripe_customer_id.as_deref() == Some(customer_id))
                .cloned())
        }

        async fn claim_stripe_customer_id(
            &self,
            user_id: &UserId,
            customer_id: &str,
        ) -> Result<ClaimResult, DomainError> {
            let mut users = self.users.lock().unwrap();
            let user = users
                .iter_mut()
                .find(|u| &u.id == user_id)
                .expect("user exists in mock");

            if let Some(winner) = &self.race_winner_id {
                user.stripe_customer_id = Some(winner.clone());
                return Ok(ClaimResult::AlreadySet);
            }

            if user.stripe_customer_id.is_some() {
                Ok(ClaimResult::AlreadySet)
            } else {
                user.stripe_customer_id = Some(customer_id.to_string());
                Ok(ClaimResult::Claimed)
            }
        }
    }

    struct MockPaymentProvider {
        create_calls: AtomicU32,
        fail_create: bool,
    }

    impl MockPaymentProvider {
        fn new() -> Self {
            Self {
                create_calls: AtomicU32::new(0),
                fail_create: false,
            }
        }

        fn failing() -> Self {
            Self {
                create_calls: AtomicU32::new(0),
                fail_create: true,
            }
        }

        fn create_calls(&self) -> u32 {
            self.create_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentProvider for MockPaymentProvider {
        async fn create_customer(
            &self,
            request: CreateCustomerRequest,
        ) -> Result<Customer, PaymentError> {
            self.create_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_create {
                return Err(PaymentError::network("connection refused"));
            }
            Ok(Customer {
                id: format!("cus_for_{}", request.user_id),
                email: Some(request.email),
            })
        }

        async fn create_checkout_session(
            &self,
            _request: CreateCheckoutRequest,
        ) -> Result<CheckoutSession, PaymentError> {
            unimplemented!("not exercised by provisioning")
        }

        async fn get_subscription(
            &self,
            _subscription_id: &str,
        ) -> Result<Option<SubscriptionSnapshot>, PaymentError> {
            unimplemented!("not exercised by provisioning")
        }

        async fn cancel_subscription(
            &self,
            _subscription_id: &str,
        ) -> Result<SubscriptionSnapshot, PaymentError> {
            unimplemented!("not exercised by provisioning")
        }
    }

    fn unprovisioned_user() -> User {
        User {
            id: UserId::new(),
            email: "reader@example.com".to_string(),
            full_name: None,
            role: UserRole::User,
            stripe_customer_id: None,
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn provisions_customer_for_new_user() {
        let user = unprovisioned_user();
        let user_id = user.id;
        let users = Arc::new(MockUserRepository::with_user(user));
        let provider = Arc::new(MockPaymentProvider::new());
        let handler = EnsureCustomerHandler::new(users.clone(), provider.clone());

        let customer_id = handler.handle(user_id).await.unwrap();

        assert_eq!(customer_id, format!("cus_for_{}", user_id));
        assert_eq!(provider.create_calls(), 1);
    }

    #[tokio::test]
    async fn second_call_is_side_effect_free() {
        let user = unprovisioned_user();
        let user_id = user.id;
        let users = Arc::new(MockUserRepository::with_user(user));
        let provider = Arc::new(MockPaymentProvider::new());
        let handler = EnsureCustomerHandler::new(users, provider.clone());

        let first = handler.handle(user_id).await.unwrap();
        let second = handler.handle(user_id).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.create_calls(), 1);
    }

    #[tokio::test]
    async fn returns_existing_id_without_external_call() {
        let mut user = unprovisioned_user();
        user.stripe_customer_id = Some("cus_existing".to_string());
        let user_id = user.id;
        let users = Arc::new(MockUserRepository::with_user(user));
        let provider = Arc::new(MockPaymentProvider::new());
        let handler = EnsureCustomerHandler::new(users, provider.clone());

        let customer_id = handler.handle(user_id).await.unwrap();

        assert_eq!(customer_id, "cus_existing");
        assert_eq!(provider.create_calls(), 0);
    }

    #[tokio::test]
    async fn lost_race_returns_stored_id() {
        let user = unprovisioned_user();
        let user_id = user.id;
        let users = Arc::new(MockUserRepository::losing_race(user, "cus_winner"));
        let provider = Arc::new(MockPaymentProvider::new());
        let handler = EnsureCustomerHandler::new(users, provider);

        let customer_id = handler.handle(user_id).await.unwrap();

        assert_eq!(customer_id, "cus_winner");
    }

    #[tokio::test]
    async fn provider_failure_leaves_local_state_untouched() {
        let user = unprovisioned_user();
        let user_id = user.id;
        let users = Arc::new(MockUserRepository::with_user(user));
        let provider = Arc::new(MockPaymentProvider::failing());
        let handler = EnsureCustomerHandler::new(users.clone(), provider);

        let result = handler.handle(user_id).await;

        assert!(matches!(result, Err(BillingError::Provider { .. })));
        let stored = users.find_by_id(&user_id).await.unwrap().unwrap();
        assert!(stored.stripe_customer_id.is_none());
    }

    #[tokio::test]
    async fn unknown_user_fails() {
        let users = Arc::new(MockUserRepository::with_user(unprovisioned_user()));
        let provider = Arc::new(MockPaymentProvider::new());
        let handler = EnsureCustomerHandler::new(users, provider);

        let result = handler.handle(UserId::new()).await;

        assert!(matches!(result, Err(BillingError::UserNotFound(_))));
    }
}
