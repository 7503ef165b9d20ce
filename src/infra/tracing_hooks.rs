use async_trait::async_trait;

use crate::{
    application::ports::{
        billing_provider::{AccountId, ProviderError},
        hooks::SubscriptionHooks,
    },
    domain::entities::subscription::Subscription,
};

/// Hooks that only log; a starting point for hosts without their own.
pub struct TracingHooks;

#[async_trait]
impl SubscriptionHooks for TracingHooks {
    async fn finalize_new_customer(&self, account: &AccountId, amount_cents: i64) {
        tracing::info!(account_id = %account, amount_cents, "New customer");
    }

    async fn finalize_new_subscription(&self, subscription: &Subscription) {
        tracing::info!(
            subscription_id = %subscription.id,
            plan = ?subscription.plan.as_ref().map(|p| p.code()),
            "New subscription"
        );
    }

    async fn finalize_upgrade(&self, subscription: &Subscription) {
        tracing::info!(subscription_id = %subscription.id, "Upgraded");
    }

    async fn finalize_downgrade(&self, subscription: &Subscription) {
        tracing::info!(subscription_id = %subscription.id, "Downgraded");
    }

    async fn finalize_cancelation(&self, subscription: &Subscription) {
        tracing::info!(subscription_id = %subscription.id, "Cancelled");
    }

    async fn finalize_card_update(&self, subscription: &Subscription) {
        tracing::info!(
            subscription_id = %subscription.id,
            last_four = ?subscription.last_four,
            "Card updated"
        );
    }

    async fn finalize_cancellation_period_change(&self, subscription: &Subscription) {
        tracing::info!(
            subscription_id = %subscription.id,
            period_end = ?subscription.current_period_end,
            "Cancellation scheduled"
        );
    }

    async fn finalize_subscription_reactivation(&self, subscription: &Subscription) {
        tracing::info!(subscription_id = %subscription.id, "Reactivated");
    }

    async fn card_was_declined(&self, subscription: &Subscription) {
        tracing::warn!(
            subscription_id = %subscription.id,
            errors = ?subscription.errors,
            "Card declined"
        );
    }

    async fn error_updating_subscription(&self, subscription: &Subscription, error: &ProviderError) {
        tracing::error!(subscription_id = %subscription.id, error = %error, "Subscription update failed");
    }

    async fn error_saving_customer(&self, subscription: &Subscription, error: &ProviderError) {
        tracing::error!(subscription_id = %subscription.id, error = %error, "Customer update failed");
    }

    async fn payment_succeeded(&self, subscription: &Subscription, amount_cents: i64) {
        tracing::info!(subscription_id = %subscription.id, amount_cents, "Payment received");
    }

    async fn charge_failed(&self, subscription: &Subscription) {
        tracing::warn!(subscription_id = %subscription.id, "Charge failed");
    }

    async fn charge_disputed(&self, subscription: &Subscription) {
        tracing::warn!(subscription_id = %subscription.id, "Charge disputed");
    }
}
