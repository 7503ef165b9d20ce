//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    application::{
        ports::billing_provider::AccountId, use_cases::synchronization::SubscriptionSyncUseCases,
    },
    domain::entities::{
        coupon::{Coupon, CouponDuration, Discount},
        plan::Plan,
        subscription::{Subscription, SubscriptionOwner},
        sync_policy::SyncConfig,
    },
    test_utils::{RecordingHooks, ScriptedBillingProvider},
};

/// Account id handed out by [`ScriptedBillingProvider::create_account`]
pub const TEST_ACCOUNT_ID: &str = "cus_test";

/// Account id of records built by [`create_active_subscription`]
pub const EXISTING_ACCOUNT_ID: &str = "cus_existing";

/// Period end reported by the scripted provider
pub fn test_period_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
}

/// Create a plan; its remote id is `price_{code}`.
pub fn create_test_plan(code: &str, rank: i32, price_cents: i64) -> Plan {
    Plan::new(
        Uuid::new_v4(),
        code,
        format!("{} plan", code),
        rank,
        price_cents,
        format!("price_{}", code),
    )
}

pub fn create_test_owner() -> SubscriptionOwner {
    SubscriptionOwner {
        id: "owner-1".to_string(),
        name: Some("Test Owner".to_string()),
        email: Some("owner@example.com".to_string()),
    }
}

pub fn create_test_coupon(code: &str) -> Coupon {
    Coupon::new(code, CouponDuration::Once, Discount::PercentOff(20))
}

/// Create an unsubscribed, not yet persisted record.
pub fn create_test_subscription(overrides: impl FnOnce(&mut Subscription)) -> Subscription {
    let mut subscription = Subscription::new(create_test_owner());
    overrides(&mut subscription);
    subscription
}

/// Create a persisted record subscribed to `plan` on [`EXISTING_ACCOUNT_ID`].
pub fn create_active_subscription(
    plan: &Plan,
    overrides: impl FnOnce(&mut Subscription),
) -> Subscription {
    let mut subscription = create_test_subscription(|s| {
        s.plan = Some(plan.clone());
        s.current_price_cents = Some(plan.price_cents());
        s.remote_account_id = Some(AccountId::new(EXISTING_ACCOUNT_ID));
        s.last_four = Some("4242".to_string());
    });
    overrides(&mut subscription);
    subscription.mark_persisted();
    subscription
}

pub fn deferred_config() -> SyncConfig {
    SyncConfig {
        deferred_cancellation: true,
        ..SyncConfig::default()
    }
}

pub fn build_sync_use_cases(
    provider: Arc<ScriptedBillingProvider>,
    hooks: Arc<RecordingHooks>,
    config: SyncConfig,
) -> SubscriptionSyncUseCases {
    SubscriptionSyncUseCases::new(provider, hooks, config)
}
