use env_helpers::get_env_default;
use secrecy::SecretString;
use url::Url;

use crate::{
    domain::entities::{
        payment_provider::PaymentProvider,
        sync_policy::{CancellationFailurePolicy, SyncConfig},
    },
    infra::{error::InfraError, stripe_client::STRIPE_API_BASE},
};

pub struct AppConfig {
    pub billing_provider: PaymentProvider,
    /// Required when `billing_provider` is Stripe.
    pub stripe_secret_key: Option<SecretString>,
    pub stripe_api_base: Url,
    /// Cancel at the end of the paid period instead of immediately.
    pub deferred_cancellation: bool,
    pub prorate: bool,
    pub free_trial_days: u32,
    pub cancellation_failure: CancellationFailurePolicy,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let billing_provider: PaymentProvider =
            get_env_default("BILLING_PROVIDER", String::from("dummy"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid {
                    var: "BILLING_PROVIDER",
                    reason: "expected stripe or dummy".to_string(),
                })?;

        let stripe_secret_key: Option<SecretString> = std::env::var("STRIPE_SECRET_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(SecretString::from);

        if billing_provider.requires_credentials() && stripe_secret_key.is_none() {
            return Err(InfraError::ConfigMissing {
                var: "STRIPE_SECRET_KEY",
            });
        }

        let stripe_api_base: Url =
            Url::parse(&get_env_default("STRIPE_API_BASE", String::from(STRIPE_API_BASE)))
                .map_err(|e| InfraError::ConfigInvalid {
                    var: "STRIPE_API_BASE",
                    reason: e.to_string(),
                })?;

        let deferred_cancellation: bool = get_env_default("DEFERRED_CANCELLATION", false);
        let prorate: bool = get_env_default("PRORATE", true);
        let free_trial_days: u32 = get_env_default("FREE_TRIAL_DAYS", 0);

        let cancellation_failure: CancellationFailurePolicy =
            get_env_default("CANCELLATION_FAILURE_POLICY", String::from("swallow"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid {
                    var: "CANCELLATION_FAILURE_POLICY",
                    reason: "expected swallow or surface".to_string(),
                })?;

        Ok(Self {
            billing_provider,
            stripe_secret_key,
            stripe_api_base,
            deferred_cancellation,
            prorate,
            free_trial_days,
            cancellation_failure,
        })
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            deferred_cancellation: self.deferred_cancellation,
            prorate: self.prorate,
            free_trial_days: self.free_trial_days,
            cancellation_failure: self.cancellation_failure,
        }
    }
}
