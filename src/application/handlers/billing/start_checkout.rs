//! StartCheckoutHandler - Command handler for starting a hosted checkout.
//!
//! The client-visible call stays synchronous and cheap: it never creates or
//! mutates a Subscription. Activation happens when the provider's completion
//! event arrives through the webhook path.

use std::sync::Arc;

use crate::domain::billing::BillingError;
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{CreateCheckoutRequest, PaymentProvider, UserRepository};

use super::ensure_customer::EnsureCustomerHandler;

/// Width of the idempotency bucket. A client double-submit inside one bucket
/// reuses the same key and therefore the same provider-side session.
const IDEMPOTENCY_BUCKET_SECS: i64 = 300;

/// Checkout plan and redirect configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Provider price identifier for the subscription plan.
    pub price_id: String,

    /// URL to redirect to after successful checkout.
    pub success_url: String,

    /// URL to redirect to after abandoned checkout.
    pub cancel_url: String,
}

/// Handler for starting the paid checkout flow.
pub struct StartCheckoutHandler {
    users: Arc<dyn UserRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
    config: CheckoutConfig,
}

impl StartCheckoutHandler {
    pub fn new(
        users: Arc<dyn UserRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            users,
            payment_provider,
            config,
        }
    }

    /// Starts a checkout session and returns the hosted URL.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` when the user record does not exist
    /// - `Provider` when the external call fails; never retried here
    pub async fn handle(&self, user_id: UserId) -> Result<String, BillingError> {
        tracing::info!(user_id = %user_id, "Starting checkout");

        let customer_id =
            EnsureCustomerHandler::new(self.users.clone(), self.payment_provider.clone())
                .handle(user_id)
                .await?;

        let session = self
            .payment_provider
            .create_checkout_session(CreateCheckoutRequest {
                customer_id,
                price_id: self.config.price_id.clone(),
                success_url: self.config.success_url.clone(),
                cancel_url: self.config.cancel_url.clone(),
                idempotency_key: idempotency_key(&user_id, Timestamp::now()),
            })
            .await?;

        tracing::info!(user_id = %user_id, session_id = %session.id, "Checkout session created");
        Ok(session.url)
    }
}

/// Derives the checkout idempotency key from the user id and a coarse
/// timestamp bucket.
fn idempotency_key(user_id: &UserId, now: Timestamp) -> String {
    let bucket = now.as_unix() / IDEMPOTENCY_BUCKET_SECS;
    format!("checkout_{}_{}", user_id, bucket)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainError, UserRole};
    use crate::domain::user::User;
    use crate::ports::{
        CheckoutSession, ClaimResult, CreateCustomerRequest, Customer, PaymentError,
        SubscriptionSnapshot,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct MockUserRepository {
        users: Mutex<Vec<User>>,
    }

    impl MockUserRepository {
        fn with_user(user: User) -> Self {
            Self {
                users: Mutex::new(vec![user]),
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
            let user = users.iter_mut().find(|u| &u.id == user_id).unwrap();
            if user.stripe_customer_id.is_some() {
                Ok(ClaimResult::AlreadySet)
            } else {
                user.stripe_customer_id = Some(customer_id.to_string());
                Ok(ClaimResult::Claimed)
            }
        }
    }

    struct MockPaymentProvider {
        checkout_requests: Mutex<Vec<CreateCheckoutRequest>>,
        fail_checkout: bool,
    }

    impl MockPaymentProvider {
        fn new() -> Self {
            Self {
                checkout_requests: Mutex::new(Vec::new()),
                fail_checkout: false,
            }
        }

        fn failing_checkout() -> Self {
            Self {
                checkout_requests: Mutex::new(Vec::new()),
                fail_checkout: true,
            }
        }

        fn checkout_requests(&self) -> Vec<CreateCheckoutRequest> {
            self.checkout_requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentProvider for MockPaymentProvider {
        async fn create_customer(
            &self,
            request: CreateCustomerRequest,
        ) -> Result<Customer, PaymentError> {
            Ok(Customer {
                id: "cus_checkout_test".to_string(),
                email: Some(request.email),
            })
        }

        async fn create_checkout_session(
            &self,
            request: CreateCheckoutRequest,
        ) -> Result<CheckoutSession, PaymentError> {
            if self.fail_checkout {
                return Err(PaymentError::provider("No such price: price_xyz"));
            }
            self.checkout_requests.lock().unwrap().push(request);
            Ok(CheckoutSession {
                id: "cs_test123".to_string(),
                url: "https://checkout.stripe.com/c/pay/cs_test123".to_string(),
            })
        }

        async fn get_subscription(
            &self,
            _subscription_id: &str,
        ) -> Result<Option<SubscriptionSnapshot>, PaymentError> {
            unimplemented!("not exercised by checkout")
        }

        async fn cancel_subscription(
            &self,
            _subscription_id: &str,
        ) -> Result<SubscriptionSnapshot, PaymentError> {
            unimplemented!("not exercised by checkout")
        }
    }

    fn test_user() -> User {
        User {
            id: UserId::new(),
            email: "reader@example.com".to_string(),
            full_name: None,
            role: UserRole::User,
            stripe_customer_id: None,
        }
    }

    fn test_config() -> CheckoutConfig {
        CheckoutConfig {
            price_id: "price_monthly".to_string(),
            success_url: "https://bookshelf.example.com/success".to_string(),
            cancel_url: "https://bookshelf.example.com/cancel".to_string(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn returns_hosted_checkout_url() {
        let user = test_user();
        let user_id = user.id;
        let users = Arc::new(MockUserRepository::with_user(user));
        let provider = Arc::new(MockPaymentProvider::new());
        let handler = StartCheckoutHandler::new(users, provider.clone(), test_config());

        let url = handler.handle(user_id).await.unwrap();

        assert_eq!(url, "https://checkout.stripe.com/c/pay/cs_test123");
    }

    #[tokio::test]
    async fn checkout_request_carries_plan_and_redirects() {
        let user = test_user();
        let user_id = user.id;
        let users = Arc::new(MockUserRepository::with_user(user));
        let provider = Arc::new(MockPaymentProvider::new());
        let handler = StartCheckoutHandler::new(users, provider.clone(), test_config());

        handler.handle(user_id).await.unwrap();

        let requests = provider.checkout_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].customer_id, "cus_checkout_test");
        assert_eq!(requests[0].price_id, "price_monthly");
        assert_eq!(
            requests[0].success_url,
            "https://bookshelf.example.com/success"
        );
        assert_eq!(
            requests[0].cancel_url,
            "https://bookshelf.example.com/cancel"
        );
        assert!(requests[0]
            .idempotency_key
            .starts_with(&format!("checkout_{}", user_id)));
    }

    #[tokio::test]
    async fn provisions_customer_as_part_of_checkout() {
        let user = test_user();
        let user_id = user.id;
        let users = Arc::new(MockUserRepository::with_user(user));
        let provider = Arc::new(MockPaymentProvider::new());
        let handler = StartCheckoutHandler::new(users.clone(), provider, test_config());

        handler.handle(user_id).await.unwrap();

        let stored = users.find_by_id(&user_id).await.unwrap().unwrap();
        assert_eq!(stored.stripe_customer_id.as_deref(), Some("cus_checkout_test"));
    }

    #[tokio::test]
    async fn provider_failure_is_surfaced() {
        let user = test_user();
        let user_id = user.id;
        let users = Arc::new(MockUserRepository::with_user(user));
        let provider = Arc::new(MockPaymentProvider::failing_checkout());
        let handler = StartCheckoutHandler::new(users, provider, test_config());

        let result = handler.handle(user_id).await;

        match result {
            Err(BillingError::Provider { message, .. }) => {
                assert!(message.contains("No such price"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_user_fails_without_external_call() {
        let users = Arc::new(MockUserRepository::with_user(test_user()));
        let provider = Arc::new(MockPaymentProvider::new());
        let handler = StartCheckoutHandler::new(users, provider.clone(), test_config());

        let result = handler.handle(UserId::new()).await;

        assert!(matches!(result, Err(BillingError::UserNotFound(_))));
        assert!(provider.checkout_requests().is_empty());
    }

    // ══════════════════════════════════════════════════════════════
    // Idempotency Key Derivation
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn same_bucket_derives_same_key() {
        let user_id = UserId::new();
        let t0 = Timestamp::from_unix(1_704_067_200).unwrap(); // bucket boundary
        let t1 = t0.add_secs(299);

        assert_eq!(idempotency_key(&user_id, t0), idempotency_key(&user_id, t1));
    }

    #[test]
    fn next_bucket_derives_different_key() {
        let user_id = UserId::new();
        let t0 = Timestamp::from_unix(1_704_067_200).unwrap();
        let t1 = t0.add_secs(300);

        assert_ne!(idempotency_key(&user_id, t0), idempotency_key(&user_id, t1));
    }

    #[test]
    fn different_users_derive_different_keys() {
        let now = Timestamp::now();
        assert_ne!(
            idempotency_key(&UserId::new(), now),
            idempotency_key(&UserId::new(), now)
        );
    }
}
