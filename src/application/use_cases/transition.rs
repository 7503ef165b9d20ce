use serde::Serialize;
use strum::{AsRefStr, Display};

use crate::domain::entities::{subscription::Subscription, sync_policy::SyncConfig};

/// The kind of work a synchronization call performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Transition {
    PlanChange,
    CancellationPeriod,
    CardUpdate,
    Noop,
}

impl Transition {
    /// Every intent pending on the record, highest priority first.
    /// Empty when nothing needs to reach the provider.
    pub fn pending(subscription: &Subscription, config: &SyncConfig) -> Vec<Transition> {
        let mut pending = Vec::new();
        if subscription.is_changing_plans() {
            pending.push(Transition::PlanChange);
        }
        if config.deferred_cancellation && subscription.is_changing_cancellation_period() {
            pending.push(Transition::CancellationPeriod);
        }
        if subscription.has_card_token() {
            pending.push(Transition::CardUpdate);
        }
        pending
    }

    /// First match wins; only one transition runs per call.
    pub fn classify(subscription: &Subscription, config: &SyncConfig) -> Transition {
        Self::pending(subscription, config)
            .into_iter()
            .next()
            .unwrap_or(Transition::Noop)
    }
}
