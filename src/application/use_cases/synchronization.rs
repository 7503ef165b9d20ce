use secrecy::SecretString;
use serde::Serialize;
use std::sync::Arc;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::{
            billing_provider::{AccountId, BillingProviderPort, NewAccountRequest, ProviderError},
            hooks::SubscriptionHooks,
        },
        use_cases::transition::Transition,
    },
    domain::entities::{
        plan::{Plan, PlanChange},
        subscription::Subscription,
        sync_policy::{CancellationFailurePolicy, SyncConfig},
    },
};

/// What a successful synchronization call did.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub transition: Transition,
    /// Direction of the plan switch, for plan changes to a new plan
    pub plan_change: Option<PlanChange>,
    /// Changes still pending on the record; the next call picks them up
    pub deferred: Vec<Transition>,
    /// A card token came with a higher-priority change and was discarded
    pub dropped_card_token: bool,
    /// The remote cancellation failed and was only logged
    pub remote_cancellation_failed: bool,
}

impl SyncReport {
    fn new(transition: Transition) -> Self {
        Self {
            transition,
            plan_change: None,
            deferred: Vec::new(),
            dropped_card_token: false,
            remote_cancellation_failed: false,
        }
    }
}

/// Which error hook reports a non-decline failure
#[derive(Debug, Clone, Copy)]
enum FailureHook {
    SavingCustomer,
    UpdatingSubscription,
}

// ============================================================================
// Use Cases
// ============================================================================

/// Keeps a local [`Subscription`] and its remote billing account consistent.
///
/// Call [`synchronize`](Self::synchronize) right before the record is persisted.
/// Exactly one transition runs per call (plan change, then cancellation period,
/// then card update). Field changes are staged and only committed once every
/// remote call of the transition succeeded, so a failed call leaves the record's
/// synchronized fields untouched and the change still pending.
#[derive(Clone)]
pub struct SubscriptionSyncUseCases {
    provider: Arc<dyn BillingProviderPort>,
    hooks: Arc<dyn SubscriptionHooks>,
    config: SyncConfig,
}

impl SubscriptionSyncUseCases {
    pub fn new(
        provider: Arc<dyn BillingProviderPort>,
        hooks: Arc<dyn SubscriptionHooks>,
        config: SyncConfig,
    ) -> Self {
        Self {
            provider,
            hooks,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub async fn synchronize(&self, subscription: &mut Subscription) -> AppResult<SyncReport> {
        subscription.errors.clear();

        let transition = Transition::classify(subscription, &self.config);
        // One-time credential: consumed by this call whatever happens
        let card_token = subscription.take_card_token();

        let mut report = SyncReport::new(transition);

        match transition {
            Transition::PlanChange => {
                report.plan_change = subscription.plan_change();
                self.sync_plan_change(subscription, card_token, &mut report)
                    .await?;
            }
            Transition::CancellationPeriod => {
                report.dropped_card_token = card_token.is_some();
                self.sync_cancellation_period(subscription).await?;
            }
            Transition::CardUpdate => {
                let card_token = card_token.ok_or_else(|| {
                    AppError::Internal("card update without a card token".into())
                })?;
                self.sync_card(subscription, &card_token).await?;
            }
            Transition::Noop => {
                tracing::debug!(
                    subscription_id = %subscription.id,
                    "No pending subscription change"
                );
            }
        }

        report.deferred = Transition::pending(subscription, &self.config);
        if !report.deferred.is_empty() || report.dropped_card_token {
            tracing::warn!(
                subscription_id = %subscription.id,
                transition = %transition,
                deferred = ?report.deferred,
                dropped_card_token = report.dropped_card_token,
                "Only the highest-priority subscription change was synchronized"
            );
        }

        Ok(report)
    }

    // ========================================================================
    // Plan change
    // ========================================================================

    async fn sync_plan_change(
        &self,
        subscription: &mut Subscription,
        card_token: Option<SecretString>,
        report: &mut SyncReport,
    ) -> AppResult<()> {
        let account = subscription.remote_account_id.clone();
        let new_plan = subscription.plan.clone();

        match (account, new_plan) {
            (None, Some(plan)) => {
                let card_token = card_token.ok_or(AppError::MissingCardToken)?;
                self.hooks.prepare_for_plan_change(subscription).await;
                self.start_subscription(subscription, &plan, card_token)
                    .await?;
            }
            (None, None) => {
                self.hooks.prepare_for_plan_change(subscription).await;
                // No remote account means there is nothing to cancel remotely
                let mut draft = subscription.draft();
                draft.plan = None;
                draft.current_price_cents = None;
                draft.settles_plan = true;
                subscription.commit(draft);
            }
            (Some(account), Some(plan)) => {
                report.dropped_card_token = card_token.is_some();
                self.hooks.prepare_for_plan_change(subscription).await;
                self.change_subscription(subscription, &account, &plan)
                    .await?;
            }
            (Some(account), None) => {
                report.dropped_card_token = card_token.is_some();
                self.hooks.prepare_for_plan_change(subscription).await;
                report.remote_cancellation_failed =
                    self.cancel_subscription(subscription, &account).await?;
            }
        }

        self.hooks.finalize_plan_change(subscription).await;
        Ok(())
    }

    /// Open the remote account and attach the plan to it.
    async fn start_subscription(
        &self,
        subscription: &mut Subscription,
        plan: &Plan,
        card_token: SecretString,
    ) -> AppResult<()> {
        let mut draft = subscription.draft();
        draft.current_price_cents = Some(plan.price_cents());
        draft.settles_plan = true;

        self.hooks.prepare_for_new_subscription(subscription).await;
        self.hooks.prepare_for_upgrade(subscription).await;

        let request = NewAccountRequest {
            description: subscription.owner.description(),
            email: subscription.owner.contact_email(),
            card_token,
            coupon_code: subscription.coupon.as_ref().map(|c| c.code().to_string()),
        };

        let account = match self.provider.create_account(&request).await {
            Ok(account) => account,
            Err(e) => {
                return Err(self
                    .abort(subscription, e, FailureHook::SavingCustomer)
                    .await);
            }
        };

        tracing::info!(
            subscription_id = %subscription.id,
            account_id = %account.id,
            "Created remote billing account"
        );
        self.hooks
            .finalize_new_customer(&account.id, plan.price_cents())
            .await;

        if let Err(e) = self
            .provider
            .update_subscription(&account.id, plan.remote_plan_id(), self.config.prorate)
            .await
        {
            return Err(self
                .abort(subscription, e, FailureHook::UpdatingSubscription)
                .await);
        }

        let last_four = match account.default_source {
            Some(source) => Some(source.last4),
            None => self.fetch_last_four(&account.id).await,
        };

        draft.remote_account_id = Some(account.id);
        draft.last_four = last_four;
        subscription.commit(draft);

        tracing::info!(
            subscription_id = %subscription.id,
            plan = %plan.code(),
            "Subscription started"
        );
        self.hooks.finalize_new_subscription(subscription).await;
        self.hooks.finalize_upgrade(subscription).await;
        Ok(())
    }

    /// Switch an existing account to another plan, applying the coupon first.
    async fn change_subscription(
        &self,
        subscription: &mut Subscription,
        account: &AccountId,
        plan: &Plan,
    ) -> AppResult<()> {
        let direction = PlanChange::between(subscription.previous_plan(), plan);

        let mut draft = subscription.draft();
        draft.current_price_cents = Some(plan.price_cents());
        draft.settles_plan = true;

        match direction {
            PlanChange::Downgrade => self.hooks.prepare_for_downgrade(subscription).await,
            PlanChange::Upgrade => self.hooks.prepare_for_upgrade(subscription).await,
            PlanChange::Lateral => {}
        }

        if let Some(code) = subscription.coupon.as_ref().map(|c| c.code().to_string()) {
            self.hooks.prepare_for_coupon_application(subscription).await;

            if let Err(e) = self.provider.apply_coupon(account, &code).await {
                return Err(self
                    .abort(subscription, e, FailureHook::SavingCustomer)
                    .await);
            }

            self.hooks.finalize_coupon_application(subscription).await;
        }

        // An applied coupon stays on the account even if the switch fails
        let remote = match self
            .provider
            .update_subscription(account, plan.remote_plan_id(), self.config.prorate)
            .await
        {
            Ok(remote) => remote,
            Err(e) => {
                return Err(self
                    .abort(subscription, e, FailureHook::UpdatingSubscription)
                    .await);
            }
        };

        // The switch may have cleared a scheduled cancellation. A local flag
        // change still pending is left for the next call.
        if !subscription.is_changing_cancellation_period() {
            draft.cancel_at_period_end = remote.cancel_at_period_end;
            if !remote.cancel_at_period_end {
                draft.current_period_end = None;
            }
            draft.settles_cancellation = true;
        }

        subscription.commit(draft);

        tracing::info!(
            subscription_id = %subscription.id,
            account_id = %account,
            plan = %plan.code(),
            change_type = direction.as_str(),
            prorate = self.config.prorate,
            "Subscription plan changed"
        );

        match direction {
            PlanChange::Downgrade => self.hooks.finalize_downgrade(subscription).await,
            PlanChange::Upgrade => self.hooks.finalize_upgrade(subscription).await,
            PlanChange::Lateral => {}
        }
        Ok(())
    }

    /// Cancel the remote subscription now. Returns whether a remote failure was swallowed.
    async fn cancel_subscription(
        &self,
        subscription: &mut Subscription,
        account: &AccountId,
    ) -> AppResult<bool> {
        let mut draft = subscription.draft();
        draft.plan = None;
        draft.current_price_cents = None;
        draft.cancel_at_period_end = false;
        draft.current_period_end = None;
        draft.settles_plan = true;
        draft.settles_cancellation = true;

        self.hooks.prepare_for_cancelation(subscription).await;

        let mut swallowed = false;
        if let Err(e) = self.provider.cancel_subscription(account, false).await {
            match self.config.cancellation_failure {
                CancellationFailurePolicy::Swallow => {
                    tracing::error!(
                        subscription_id = %subscription.id,
                        account_id = %account,
                        error = %e,
                        "Remote cancellation failed, cancelling locally"
                    );
                    swallowed = true;
                }
                CancellationFailurePolicy::Surface => {
                    return Err(self
                        .abort(subscription, e, FailureHook::UpdatingSubscription)
                        .await);
                }
            }
        }

        subscription.commit(draft);

        tracing::info!(
            subscription_id = %subscription.id,
            account_id = %account,
            "Subscription cancelled"
        );
        self.hooks.finalize_cancelation(subscription).await;
        Ok(swallowed)
    }

    // ========================================================================
    // Cancellation period
    // ========================================================================

    async fn sync_cancellation_period(&self, subscription: &mut Subscription) -> AppResult<()> {
        let account = subscription
            .remote_account_id
            .clone()
            .ok_or(AppError::MissingRemoteAccount)?;

        let mut draft = subscription.draft();
        draft.settles_cancellation = true;

        if subscription.cancel_at_period_end {
            self.hooks
                .prepare_for_cancellation_period_change(subscription)
                .await;

            let remote = match self.provider.cancel_subscription(&account, true).await {
                Ok(remote) => remote,
                Err(e) => {
                    return Err(self
                        .abort(subscription, e, FailureHook::UpdatingSubscription)
                        .await);
                }
            };

            draft.current_period_end = remote.current_period_end;
            subscription.commit(draft);

            tracing::info!(
                subscription_id = %subscription.id,
                account_id = %account,
                period_end = ?subscription.current_period_end,
                "Subscription set to cancel at period end"
            );
            self.hooks
                .finalize_cancellation_period_change(subscription)
                .await;
        } else {
            self.hooks
                .prepare_for_subscription_reactivation(subscription)
                .await;

            let item = match self.provider.retrieve_subscription_item(&account).await {
                Ok(item) => item,
                Err(e) => {
                    return Err(self
                        .abort(subscription, e, FailureHook::UpdatingSubscription)
                        .await);
                }
            };

            // Resubmitting the current item clears the scheduled cancellation
            if let Err(e) = self
                .provider
                .update_subscription(&account, &item.remote_plan_id, self.config.prorate)
                .await
            {
                return Err(self
                    .abort(subscription, e, FailureHook::UpdatingSubscription)
                    .await);
            }

            draft.cancel_at_period_end = false;
            draft.current_period_end = None;
            subscription.commit(draft);

            tracing::info!(
                subscription_id = %subscription.id,
                account_id = %account,
                "Subscription reactivated"
            );
            self.hooks
                .finalize_subscription_reactivation(subscription)
                .await;
        }

        Ok(())
    }

    // ========================================================================
    // Card update
    // ========================================================================

    async fn sync_card(
        &self,
        subscription: &mut Subscription,
        card_token: &SecretString,
    ) -> AppResult<()> {
        let account = subscription
            .remote_account_id
            .clone()
            .ok_or(AppError::MissingRemoteAccount)?;

        self.hooks.prepare_for_card_update(subscription).await;

        let source = match self
            .provider
            .update_default_source(&account, card_token)
            .await
        {
            Ok(source) => source,
            Err(e) => {
                return Err(self
                    .abort(subscription, e, FailureHook::SavingCustomer)
                    .await);
            }
        };

        let mut draft = subscription.draft();
        draft.last_four = Some(source.last4);
        subscription.commit(draft);

        tracing::info!(
            subscription_id = %subscription.id,
            account_id = %account,
            "Default payment source updated"
        );
        self.hooks.finalize_card_update(subscription).await;
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn fetch_last_four(&self, account: &AccountId) -> Option<String> {
        match self.provider.retrieve_account(account).await {
            Ok(remote) => remote.default_source.map(|s| s.last4),
            Err(e) => {
                tracing::warn!(
                    account_id = %account,
                    error = %e,
                    "Could not read default payment source"
                );
                None
            }
        }
    }

    /// Record a provider failure on the record and fire the matching hook.
    async fn abort(
        &self,
        subscription: &mut Subscription,
        error: ProviderError,
        hook: FailureHook,
    ) -> AppError {
        subscription.errors.push(error.message().to_string());

        if error.is_declined() {
            tracing::warn!(
                subscription_id = %subscription.id,
                reason = %error,
                "Card declined"
            );
            self.hooks.card_was_declined(subscription).await;
        } else {
            tracing::error!(
                subscription_id = %subscription.id,
                error = %error,
                "Billing provider call failed"
            );
            match hook {
                FailureHook::SavingCustomer => {
                    self.hooks.error_saving_customer(subscription, &error).await
                }
                FailureHook::UpdatingSubscription => {
                    self.hooks
                        .error_updating_subscription(subscription, &error)
                        .await
                }
            }
        }

        error.into()
    }
}
