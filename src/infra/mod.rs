pub mod config;
pub mod dummy_billing_client;
pub mod error;
pub mod setup;
pub mod stripe_billing_adapter;
pub mod stripe_client;
pub mod tracing_hooks;
