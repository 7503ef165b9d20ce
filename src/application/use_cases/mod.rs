pub mod billing_provider_factory;
pub mod synchronization;
pub mod transition;
pub mod webhook;
