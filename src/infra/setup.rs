use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    application::{
        ports::hooks::SubscriptionHooks,
        use_cases::{
            billing_provider_factory::BillingProviderFactory,
            synchronization::SubscriptionSyncUseCases, webhook::WebhookFinalizer,
        },
    },
    infra::{config::AppConfig, error::InfraError},
};

/// Engine and webhook finalizer wired to the configured provider.
pub struct BillingServices {
    pub sync_use_cases: SubscriptionSyncUseCases,
    pub webhook_finalizer: WebhookFinalizer,
}

pub fn init_billing_services(
    config: &AppConfig,
    hooks: Arc<dyn SubscriptionHooks>,
) -> Result<BillingServices, InfraError> {
    let provider = BillingProviderFactory::from_config(config).get(config.billing_provider)?;

    tracing::info!(
        provider = %provider.provider().display_name(),
        deferred_cancellation = config.deferred_cancellation,
        prorate = config.prorate,
        cancellation_failure = %config.cancellation_failure,
        "Billing provider ready"
    );

    Ok(BillingServices {
        sync_use_cases: SubscriptionSyncUseCases::new(provider, hooks.clone(), config.sync_config()),
        webhook_finalizer: WebhookFinalizer::new(hooks),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "subscription_sync=debug,info".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don’t show target (module path)
        .with_level(true)
        .pretty();

    // File (structured JSON logs), skipped when the file can't be created
    let json_layer = File::create("billing.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
