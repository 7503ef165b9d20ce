use secrecy::SecretString;
use std::sync::Arc;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::billing_provider::BillingProviderPort,
    domain::entities::payment_provider::PaymentProvider,
    infra::{
        config::AppConfig, dummy_billing_client::DummyBillingClient,
        stripe_billing_adapter::StripeBillingAdapter,
    },
};

/// Factory for creating billing provider instances based on configuration.
pub struct BillingProviderFactory {
    stripe_secret_key: Option<SecretString>,
    stripe_api_base: Url,
    #[cfg(test)]
    test_provider_override: Option<Arc<dyn BillingProviderPort>>,
}

impl BillingProviderFactory {
    pub fn new(stripe_secret_key: Option<SecretString>, stripe_api_base: Url) -> Self {
        Self {
            stripe_secret_key,
            stripe_api_base,
            #[cfg(test)]
            test_provider_override: None,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.stripe_secret_key.clone(),
            config.stripe_api_base.clone(),
        )
    }

    #[cfg(test)]
    pub fn with_provider_override(mut self, provider: Arc<dyn BillingProviderPort>) -> Self {
        self.test_provider_override = Some(provider);
        self
    }

    /// Get a billing provider instance.
    ///
    /// # Errors
    /// - `ProviderNotConfigured` if the provider needs credentials that are missing
    pub fn get(&self, provider: PaymentProvider) -> AppResult<Arc<dyn BillingProviderPort>> {
        #[cfg(test)]
        if let Some(ref override_provider) = self.test_provider_override {
            return Ok(override_provider.clone());
        }

        match provider {
            PaymentProvider::Stripe => {
                let secret_key = self
                    .stripe_secret_key
                    .clone()
                    .ok_or(AppError::ProviderNotConfigured)?;
                Ok(Arc::new(StripeBillingAdapter::new(
                    secret_key,
                    self.stripe_api_base.clone(),
                )))
            }
            // Dummy provider doesn't need configuration
            PaymentProvider::Dummy => Ok(Arc::new(DummyBillingClient::new())),
        }
    }

    /// Providers without credentials are always configured.
    pub fn is_configured(&self, provider: PaymentProvider) -> bool {
        !provider.requires_credentials() || self.stripe_secret_key.is_some()
    }
}
