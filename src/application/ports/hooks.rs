use async_trait::async_trait;

use crate::{
    application::ports::billing_provider::{AccountId, ProviderError},
    domain::entities::subscription::Subscription,
};

/// Extension points invoked by the synchronization engine and the webhook finalizer.
///
/// Every method defaults to a no-op; implement only the ones you need (audit
/// logging, emails, ...). For a single synchronization call, each `prepare_*`
/// that fires is followed either by its `finalize_*` or by exactly one of
/// `card_was_declined`, `error_updating_subscription`, `error_saving_customer`.
#[async_trait]
pub trait SubscriptionHooks: Send + Sync {
    // ========================================================================
    // Before a transition
    // ========================================================================

    async fn prepare_for_plan_change(&self, _subscription: &Subscription) {}

    async fn prepare_for_new_subscription(&self, _subscription: &Subscription) {}

    async fn prepare_for_upgrade(&self, _subscription: &Subscription) {}

    async fn prepare_for_downgrade(&self, _subscription: &Subscription) {}

    async fn prepare_for_cancelation(&self, _subscription: &Subscription) {}

    async fn prepare_for_card_update(&self, _subscription: &Subscription) {}

    async fn prepare_for_coupon_application(&self, _subscription: &Subscription) {}

    async fn prepare_for_cancellation_period_change(&self, _subscription: &Subscription) {}

    async fn prepare_for_subscription_reactivation(&self, _subscription: &Subscription) {}

    // ========================================================================
    // After a transition succeeded
    // ========================================================================

    async fn finalize_plan_change(&self, _subscription: &Subscription) {}

    async fn finalize_new_subscription(&self, _subscription: &Subscription) {}

    /// The remote account exists; fires before the plan is attached to it.
    async fn finalize_new_customer(&self, _account: &AccountId, _amount_cents: i64) {}

    async fn finalize_upgrade(&self, _subscription: &Subscription) {}

    async fn finalize_downgrade(&self, _subscription: &Subscription) {}

    async fn finalize_cancelation(&self, _subscription: &Subscription) {}

    async fn finalize_card_update(&self, _subscription: &Subscription) {}

    async fn finalize_coupon_application(&self, _subscription: &Subscription) {}

    async fn finalize_cancellation_period_change(&self, _subscription: &Subscription) {}

    async fn finalize_subscription_reactivation(&self, _subscription: &Subscription) {}

    // ========================================================================
    // Failures
    // ========================================================================

    async fn card_was_declined(&self, _subscription: &Subscription) {}

    async fn error_updating_subscription(
        &self,
        _subscription: &Subscription,
        _error: &ProviderError,
    ) {
    }

    async fn error_saving_customer(&self, _subscription: &Subscription, _error: &ProviderError) {}

    // ========================================================================
    // Remote events (webhooks)
    // ========================================================================

    async fn payment_succeeded(&self, _subscription: &Subscription, _amount_cents: i64) {}

    async fn charge_failed(&self, _subscription: &Subscription) {}

    async fn charge_disputed(&self, _subscription: &Subscription) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl SubscriptionHooks for NoopHooks {}
