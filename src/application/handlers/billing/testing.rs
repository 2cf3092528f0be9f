//! In-memory port implementations shared by the billing handler tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::billing::{Subscription, SubscriptionObject, SubscriptionStatus};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::user::User;
use crate::ports::{
    CheckoutSession, ClaimResult, CreateCheckoutRequest, CreateCustomerRequest, Customer,
    PaymentError, PaymentProvider, SubscriptionRepository, SubscriptionSnapshot, UserRepository,
};

pub fn snapshot(id: &str, customer: &str, status: &str) -> SubscriptionSnapshot {
    SubscriptionSnapshot {
        id: id.to_string(),
        customer_id: customer.to_string(),
        status: status.to_string(),
        current_period_start: Some(1_704_067_200),
        current_period_end: Some(1_706_745_600),
    }
}

pub fn subscription_object(id: &str, customer: &str, status: &str) -> SubscriptionObject {
    SubscriptionObject {
        id: id.to_string(),
        customer: customer.to_string(),
        status: status.to_string(),
        current_period_start: Some(1_704_067_200),
        current_period_end: Some(1_706_745_600),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Users
// ════════════════════════════════════════════════════════════════════════════════

pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn empty() -> Self {
        Self {
            users: Mutex::new(Vec::new()),
        }
    }

    pub fn with_user(user: User) -> Self {
        Self {
            users: Mutex::new(vec![user]),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
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
            .expect("user exists in test repository");
        if user.stripe_customer_id.is_some() {
            Ok(ClaimResult::AlreadySet)
        } else {
            user.stripe_customer_id = Some(customer_id.to_string());
            Ok(ClaimResult::Claimed)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscriptions
// ════════════════════════════════════════════════════════════════════════════════

pub struct InMemorySubscriptionRepository {
    rows: Mutex<Vec<Subscription>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn find_by_user_id(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| &s.user_id == user_id)
            .cloned())
    }

    async fn find_by_stripe_id(
        &self,
        stripe_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.stripe_id == stripe_id)
            .cloned())
    }

    async fn upsert_for_user(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(existing) = rows.iter_mut().find(|s| s.user_id == subscription.user_id) {
            // Mirror of ON CONFLICT (user_id) DO UPDATE: row identity and
            // created_at survive, everything reconciled is replaced.
            existing.stripe_id = subscription.stripe_id.clone();
            existing.status = subscription.status;
            existing.current_period_start = subscription.current_period_start;
            existing.current_period_end = subscription.current_period_end;
            existing.updated_at = Timestamp::now();
        } else {
            rows.push(subscription.clone());
        }
        Ok(())
    }

    async fn overwrite_by_stripe_id(
        &self,
        stripe_id: &str,
        status: SubscriptionStatus,
        current_period_start: Option<Timestamp>,
        current_period_end: Option<Timestamp>,
    ) -> Result<bool, DomainError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|s| s.stripe_id == stripe_id) {
            Some(row) => {
                row.status = status;
                row.current_period_start = current_period_start;
                row.current_period_end = current_period_end;
                row.updated_at = Timestamp::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_status_by_stripe_id(
        &self,
        stripe_id: &str,
        status: SubscriptionStatus,
    ) -> Result<bool, DomainError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|s| s.stripe_id == stripe_id) {
            Some(row) => {
                row.status = status;
                row.updated_at = Timestamp::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment provider
// ════════════════════════════════════════════════════════════════════════════════

pub struct FakePaymentProvider {
    subscriptions: Mutex<Vec<SubscriptionSnapshot>>,
    cancel_calls: AtomicU32,
    fail_cancel: bool,
}

impl FakePaymentProvider {
    pub fn empty() -> Self {
        Self {
            subscriptions: Mutex::new(Vec::new()),
            cancel_calls: AtomicU32::new(0),
            fail_cancel: false,
        }
    }

    pub fn with_subscription(snapshot: SubscriptionSnapshot) -> Self {
        Self {
            subscriptions: Mutex::new(vec![snapshot]),
            cancel_calls: AtomicU32::new(0),
            fail_cancel: false,
        }
    }

    pub fn failing_cancel(snapshot: SubscriptionSnapshot) -> Self {
        Self {
            subscriptions: Mutex::new(vec![snapshot]),
            cancel_calls: AtomicU32::new(0),
            fail_cancel: true,
        }
    }

    pub fn cancel_calls(&self) -> u32 {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for FakePaymentProvider {
    async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<Customer, PaymentError> {
        Ok(Customer {
            id: format!("cus_for_{}", request.user_id),
            email: Some(request.email),
        })
    }

    async fn create_checkout_session(
        &self,
        _request: CreateCheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        Ok(CheckoutSession {
            id: "cs_fake".to_string(),
            url: "https://checkout.stripe.com/c/pay/cs_fake".to_string(),
        })
    }

    async fn get_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<SubscriptionSnapshot>, PaymentError> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == subscription_id)
            .cloned())
    }

    async fn cancel_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<SubscriptionSnapshot, PaymentError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_cancel {
            return Err(PaymentError::network("connection reset by peer"));
        }
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let snapshot = subscriptions
            .iter_mut()
            .find(|s| s.id == subscription_id)
            .ok_or_else(|| PaymentError::not_found("Subscription"))?;
        snapshot.status = "canceled".to_string();
        Ok(snapshot.clone())
    }
}
