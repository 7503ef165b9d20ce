use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    application::ports::billing_provider::AccountId,
    domain::entities::{
        coupon::Coupon,
        plan::{Plan, PlanChange},
        sync_policy::SyncConfig,
    },
};

/// Whoever pays for the subscription (a user, a team, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionOwner {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl SubscriptionOwner {
    /// Description sent to the provider: the owner's name, or its id.
    pub fn description(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.id)
            .to_string()
    }

    pub fn contact_email(&self) -> String {
        self.email.clone().unwrap_or_default()
    }
}

/// Label shown next to a plan the owner could switch to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanDifference {
    Upgrade,
    Downgrade,
    StartTrial,
}

/// Values as they were last persisted or synchronized.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    plan: Option<Plan>,
    cancel_at_period_end: bool,
}

/// Local subscription record kept in sync with the remote billing account.
///
/// Storage must call [`Subscription::mark_persisted`] after loading a record;
/// pending changes are detected against that snapshot. Synchronization settles
/// the snapshot itself as changes reach the provider, so a change that is still
/// pending after a save stays pending.
#[derive(Debug, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub owner: SubscriptionOwner,
    pub plan: Option<Plan>,
    pub current_price_cents: Option<i64>,
    pub remote_account_id: Option<AccountId>,
    pub last_four: Option<String>,
    pub cancel_at_period_end: bool,
    pub current_period_end: Option<DateTime<Utc>>,
    pub coupon: Option<Coupon>,
    /// One-time card token, never persisted
    #[serde(skip)]
    card_token: Option<SecretString>,
    #[serde(skip)]
    previous: Snapshot,
    #[serde(skip)]
    persisted: bool,
    /// Validation errors recorded by the last synchronization
    #[serde(skip)]
    pub errors: Vec<String>,
}

impl Subscription {
    pub fn new(owner: SubscriptionOwner) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            plan: None,
            current_price_cents: None,
            remote_account_id: None,
            last_four: None,
            cancel_at_period_end: false,
            current_period_end: None,
            coupon: None,
            card_token: None,
            previous: Snapshot::default(),
            persisted: false,
            errors: Vec::new(),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.plan.is_some()
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// Select the plan to synchronize to; `None` removes the plan.
    pub fn select_plan(&mut self, plan: Option<Plan>) {
        self.plan = plan;
    }

    pub fn attach_card_token(&mut self, token: impl Into<String>) {
        self.card_token = Some(SecretString::from(token.into()));
    }

    pub fn has_card_token(&self) -> bool {
        self.card_token
            .as_ref()
            .is_some_and(|t| !t.expose_secret().is_empty())
    }

    /// Move the card token out of the record. Empty tokens count as absent.
    pub(crate) fn take_card_token(&mut self) -> Option<SecretString> {
        self.card_token
            .take()
            .filter(|t| !t.expose_secret().is_empty())
    }

    pub fn previous_plan(&self) -> Option<&Plan> {
        self.previous.plan.as_ref()
    }

    pub fn previous_cancel_at_period_end(&self) -> bool {
        self.previous.cancel_at_period_end
    }

    pub fn is_changing_plans(&self) -> bool {
        self.plan.as_ref().map(Plan::id) != self.previous.plan.as_ref().map(Plan::id)
    }

    pub fn is_changing_cancellation_period(&self) -> bool {
        self.cancel_at_period_end != self.previous.cancel_at_period_end
    }

    /// Direction of the pending plan change, if a new plan is selected.
    pub fn plan_change(&self) -> Option<PlanChange> {
        self.plan
            .as_ref()
            .map(|to| PlanChange::between(self.previous.plan.as_ref(), to))
    }

    /// Record the current values as the stored state (after loading from storage).
    pub fn mark_persisted(&mut self) {
        self.previous = Snapshot {
            plan: self.plan.clone(),
            cancel_at_period_end: self.cancel_at_period_end,
        };
        self.persisted = true;
    }

    /// Cancel the subscription.
    ///
    /// With deferred cancellation and `force == false` only the flag is set and
    /// the plan stays until the provider reports the subscription deleted.
    pub fn cancel(&mut self, force: bool, config: &SyncConfig) {
        if config.deferred_cancellation && !force {
            self.cancel_at_period_end = true;
        } else {
            self.plan = None;
            self.current_price_cents = None;
            self.cancel_at_period_end = false;
            self.current_period_end = None;
        }
    }

    pub fn reactivate(&mut self) {
        self.cancel_at_period_end = false;
    }

    /// The provider already deleted the subscription; clear the plan locally
    /// without leaving a pending change behind.
    pub fn end_from_remote(&mut self) {
        self.plan = None;
        self.current_price_cents = None;
        self.cancel_at_period_end = false;
        self.current_period_end = None;
        self.previous = Snapshot::default();
    }

    pub fn describe_difference(&self, target: &Plan, config: &SyncConfig) -> PlanDifference {
        match self.plan.as_ref() {
            None if !self.persisted && config.has_free_trial() => PlanDifference::StartTrial,
            None => PlanDifference::Upgrade,
            Some(current) if target.is_upgrade_from(Some(current)) => PlanDifference::Upgrade,
            Some(_) => PlanDifference::Downgrade,
        }
    }

    pub(crate) fn draft(&self) -> SubscriptionDraft {
        SubscriptionDraft {
            plan: self.plan.clone(),
            current_price_cents: self.current_price_cents,
            remote_account_id: self.remote_account_id.clone(),
            last_four: self.last_four.clone(),
            cancel_at_period_end: self.cancel_at_period_end,
            current_period_end: self.current_period_end,
            settles_plan: false,
            settles_cancellation: false,
        }
    }

    /// Apply a draft produced by a successful transition.
    pub(crate) fn commit(&mut self, draft: SubscriptionDraft) {
        self.plan = draft.plan;
        self.current_price_cents = draft.current_price_cents;
        // The remote account is set at most once and never cleared
        if self.remote_account_id.is_none() {
            self.remote_account_id = draft.remote_account_id;
        }
        self.last_four = draft.last_four;
        self.cancel_at_period_end = draft.cancel_at_period_end;
        self.current_period_end = draft.current_period_end;

        if draft.settles_plan {
            self.previous.plan = self.plan.clone();
        }
        if draft.settles_cancellation {
            self.previous.cancel_at_period_end = self.cancel_at_period_end;
        }
    }
}

/// Staged field changes of one transition, committed only when every remote
/// call of the transition succeeded.
#[derive(Debug, Clone)]
pub(crate) struct SubscriptionDraft {
    pub plan: Option<Plan>,
    pub current_price_cents: Option<i64>,
    pub remote_account_id: Option<AccountId>,
    pub last_four: Option<String>,
    pub cancel_at_period_end: bool,
    pub current_period_end: Option<DateTime<Utc>>,
    pub settles_plan: bool,
    pub settles_cancellation: bool,
}
