use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Payment provider type - the billing service holding the remote accounts
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[derive(Default)]
pub enum PaymentProvider {
    Stripe,
    #[default]
    Dummy,
}

impl PaymentProvider {
    /// Human-readable display name for the provider
    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentProvider::Stripe => "Stripe",
            PaymentProvider::Dummy => "Test Provider",
        }
    }

    /// Whether the provider needs credentials to be constructed
    pub fn requires_credentials(&self) -> bool {
        matches!(self, PaymentProvider::Stripe)
    }

    /// All available providers
    pub fn all() -> &'static [PaymentProvider] {
        &[PaymentProvider::Stripe, PaymentProvider::Dummy]
    }
}
