//! Premium access gate.
//!
//! The single place that decides whether a user has premium access. Every
//! enforcement point (review submission, status endpoint, ...) must call
//! through here so the rule cannot drift between call sites.

use crate::domain::foundation::{Timestamp, UserRole};

use super::Subscription;

/// Pure decision function: does this user have premium access at `now`?
///
/// - Admins always have access, with or without a subscription row.
/// - Everyone else needs a subscription that is `active` with a set
///   `current_period_end` strictly after `now`.
/// - No subscription row means no access.
pub fn has_premium_access(
    role: UserRole,
    subscription: Option<&Subscription>,
    now: Timestamp,
) -> bool {
    if role.is_admin() {
        return true;
    }

    subscription
        .map(|sub| sub.grants_access_at(now))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::SubscriptionStatus;
    use crate::domain::foundation::UserId;

    fn subscription(status: SubscriptionStatus, period_end: Option<Timestamp>) -> Subscription {
        Subscription::from_snapshot(UserId::new(), "sub_gate", status, None, period_end)
    }

    #[test]
    fn admin_has_access_without_subscription() {
        assert!(has_premium_access(UserRole::Admin, None, Timestamp::now()));
    }

    #[test]
    fn admin_has_access_with_expired_subscription() {
        let now = Timestamp::now();
        let sub = subscription(SubscriptionStatus::Expired, Some(now.add_days(-10)));
        assert!(has_premium_access(UserRole::Admin, Some(&sub), now));
    }

    #[test]
    fn user_without_subscription_has_no_access() {
        assert!(!has_premium_access(UserRole::User, None, Timestamp::now()));
    }

    #[test]
    fn active_subscription_one_second_before_period_end_grants_access() {
        let now = Timestamp::now();
        let sub = subscription(SubscriptionStatus::Active, Some(now.add_secs(1)));
        assert!(has_premium_access(UserRole::User, Some(&sub), now));
    }

    #[test]
    fn active_subscription_one_second_after_period_end_denies_access() {
        let now = Timestamp::now();
        let sub = subscription(SubscriptionStatus::Active, Some(now.add_secs(-1)));
        assert!(!has_premium_access(UserRole::User, Some(&sub), now));
    }

    #[test]
    fn canceled_subscription_denies_access_regardless_of_period_end() {
        let now = Timestamp::now();
        let sub = subscription(SubscriptionStatus::Canceled, Some(now.add_days(30)));
        assert!(!has_premium_access(UserRole::User, Some(&sub), now));
    }

    #[test]
    fn active_subscription_without_period_end_denies_access() {
        let now = Timestamp::now();
        let sub = subscription(SubscriptionStatus::Active, None);
        assert!(!has_premium_access(UserRole::User, Some(&sub), now));
    }
}
