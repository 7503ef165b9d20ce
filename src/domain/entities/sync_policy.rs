use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// What to do when the remote cancellation fails while a plan is being removed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[derive(Default)]
pub enum CancellationFailurePolicy {
    /// Log the failure and cancel locally anyway
    #[default]
    Swallow,
    /// Abort like any other provider failure
    Surface,
}

/// Behavior switches of the synchronization engine, resolved by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Cancel at the end of the billing period instead of immediately
    pub deferred_cancellation: bool,
    /// Let the provider prorate plan switches
    pub prorate: bool,
    /// Free trial length, only used to describe plan differences
    pub free_trial_days: u32,
    pub cancellation_failure: CancellationFailurePolicy,
}

impl SyncConfig {
    pub fn has_free_trial(&self) -> bool {
        self.free_trial_days > 0
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            deferred_cancellation: false,
            prorate: true,
            free_trial_days: 0,
            cancellation_failure: CancellationFailurePolicy::Swallow,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert!(!config.deferred_cancellation);
        assert!(config.prorate);
        assert!(!config.has_free_trial());
        assert_eq!(config.cancellation_failure, CancellationFailurePolicy::Swallow);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "surface".parse::<CancellationFailurePolicy>().unwrap(),
            CancellationFailurePolicy::Surface
        );
        assert_eq!(
            "SWALLOW".parse::<CancellationFailurePolicy>().unwrap(),
            CancellationFailurePolicy::Swallow
        );
        assert!("ignore".parse::<CancellationFailurePolicy>().is_err());
    }
}
