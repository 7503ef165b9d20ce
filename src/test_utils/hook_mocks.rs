//! Hooks that record every call, in order.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::{
    application::ports::{
        billing_provider::{AccountId, ProviderError},
        hooks::SubscriptionHooks,
    },
    domain::entities::subscription::Subscription,
};

const FAILURE_HOOKS: [&str; 3] = [
    "card_was_declined",
    "error_updating_subscription",
    "error_saving_customer",
];

#[derive(Default)]
pub struct RecordingHooks {
    events: Mutex<Vec<String>>,
    new_customer_amounts: Mutex<Vec<i64>>,
    payment_amounts: Mutex<Vec<i64>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, name: &str) {
        self.events.lock().unwrap().push(name.to_string());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.events().iter().any(|e| e == name)
    }

    pub fn failure_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| FAILURE_HOOKS.contains(&e.as_str()))
            .count()
    }

    /// `finalize_new_customer` fires before the plan is attached, so it can
    /// precede a failure.
    pub fn finalize_count_excluding_new_customer(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| e.starts_with("finalize_") && e.as_str() != "finalize_new_customer")
            .count()
    }

    pub fn new_customer_amounts(&self) -> Vec<i64> {
        self.new_customer_amounts.lock().unwrap().clone()
    }

    pub fn payment_amounts(&self) -> Vec<i64> {
        self.payment_amounts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SubscriptionHooks for RecordingHooks {
    async fn prepare_for_plan_change(&self, _subscription: &Subscription) {
        self.push("prepare_for_plan_change");
    }

    async fn prepare_for_new_subscription(&self, _subscription: &Subscription) {
        self.push("prepare_for_new_subscription");
    }

    async fn prepare_for_upgrade(&self, _subscription: &Subscription) {
        self.push("prepare_for_upgrade");
    }

    async fn prepare_for_downgrade(&self, _subscription: &Subscription) {
        self.push("prepare_for_downgrade");
    }

    async fn prepare_for_cancelation(&self, _subscription: &Subscription) {
        self.push("prepare_for_cancelation");
    }

    async fn prepare_for_card_update(&self, _subscription: &Subscription) {
        self.push("prepare_for_card_update");
    }

    async fn prepare_for_coupon_application(&self, _subscription: &Subscription) {
        self.push("prepare_for_coupon_application");
    }

    async fn prepare_for_cancellation_period_change(&self, _subscription: &Subscription) {
        self.push("prepare_for_cancellation_period_change");
    }

    async fn prepare_for_subscription_reactivation(&self, _subscription: &Subscription) {
        self.push("prepare_for_subscription_reactivation");
    }

    async fn finalize_plan_change(&self, _subscription: &Subscription) {
        self.push("finalize_plan_change");
    }

    async fn finalize_new_subscription(&self, _subscription: &Subscription) {
        self.push("finalize_new_subscription");
    }

    async fn finalize_new_customer(&self, _account: &AccountId, amount_cents: i64) {
        self.push("finalize_new_customer");
        self.new_customer_amounts.lock().unwrap().push(amount_cents);
    }

    async fn finalize_upgrade(&self, _subscription: &Subscription) {
        self.push("finalize_upgrade");
    }

    async fn finalize_downgrade(&self, _subscription: &Subscription) {
        self.push("finalize_downgrade");
    }

    async fn finalize_cancelation(&self, _subscription: &Subscription) {
        self.push("finalize_cancelation");
    }

    async fn finalize_card_update(&self, _subscription: &Subscription) {
        self.push("finalize_card_update");
    }

    async fn finalize_coupon_application(&self, _subscription: &Subscription) {
        self.push("finalize_coupon_application");
    }

    async fn finalize_cancellation_period_change(&self, _subscription: &Subscription) {
        self.push("finalize_cancellation_period_change");
    }

    async fn finalize_subscription_reactivation(&self, _subscription: &Subscription) {
        self.push("finalize_subscription_reactivation");
    }

    async fn card_was_declined(&self, _subscription: &Subscription) {
        self.push("card_was_declined");
    }

    async fn error_updating_subscription(&self, _subscription: &Subscription, _error: &ProviderError) {
        self.push("error_updating_subscription");
    }

    async fn error_saving_customer(&self, _subscription: &Subscription, _error: &ProviderError) {
        self.push("error_saving_customer");
    }

    async fn payment_succeeded(&self, _subscription: &Subscription, amount_cents: i64) {
        self.push("payment_succeeded");
        self.payment_amounts.lock().unwrap().push(amount_cents);
    }

    async fn charge_failed(&self, _subscription: &Subscription) {
        self.push("charge_failed");
    }

    async fn charge_disputed(&self, _subscription: &Subscription) {
        self.push("charge_disputed");
    }
}
