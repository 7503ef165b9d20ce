use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Payment scenario for the dummy provider.
/// Simulates different payment outcomes, keyed by Stripe's test card tokens.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[derive(Default)]
pub enum PaymentScenario {
    /// Card is accepted (tok_visa)
    #[default]
    Success,
    /// Card is declined (tok_chargeDeclined)
    Decline,
    /// Insufficient funds (tok_chargeDeclinedInsufficientFunds)
    InsufficientFunds,
    /// Card is expired (tok_chargeDeclinedExpiredCard)
    ExpiredCard,
    /// Processing error (tok_chargeDeclinedProcessingError)
    ProcessingError,
}

impl PaymentScenario {
    /// Stripe test token that triggers this scenario
    pub fn test_token(&self) -> &'static str {
        match self {
            PaymentScenario::Success => "tok_visa",
            PaymentScenario::Decline => "tok_chargeDeclined",
            PaymentScenario::InsufficientFunds => "tok_chargeDeclinedInsufficientFunds",
            PaymentScenario::ExpiredCard => "tok_chargeDeclinedExpiredCard",
            PaymentScenario::ProcessingError => "tok_chargeDeclinedProcessingError",
        }
    }

    /// Detect the scenario from a card token
    pub fn from_card_token(token: &str) -> Self {
        match token.trim() {
            "tok_chargeDeclined" => PaymentScenario::Decline,
            "tok_chargeDeclinedInsufficientFunds" => PaymentScenario::InsufficientFunds,
            "tok_chargeDeclinedExpiredCard" => PaymentScenario::ExpiredCard,
            "tok_chargeDeclinedProcessingError" => PaymentScenario::ProcessingError,
            // Any other token starting with the decline prefix is a generic decline
            s if s.starts_with("tok_chargeDeclined") => PaymentScenario::Decline,
            _ => PaymentScenario::Success,
        }
    }

    /// Last four digits of the simulated card
    pub fn last4(&self) -> &'static str {
        match self {
            PaymentScenario::Success => "4242",
            PaymentScenario::Decline => "0002",
            PaymentScenario::InsufficientFunds => "9995",
            PaymentScenario::ExpiredCard => "0069",
            PaymentScenario::ProcessingError => "0119",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PaymentScenario::Success)
    }

    /// Get the error message for failed scenarios
    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            PaymentScenario::Success => None,
            PaymentScenario::Decline => Some("Your card was declined."),
            PaymentScenario::InsufficientFunds => Some("Your card has insufficient funds."),
            PaymentScenario::ExpiredCard => Some("Your card has expired."),
            PaymentScenario::ProcessingError => {
                Some("An error occurred while processing your card.")
            }
        }
    }

    /// All available scenarios
    pub fn all() -> &'static [PaymentScenario] {
        &[
            PaymentScenario::Success,
            PaymentScenario::Decline,
            PaymentScenario::InsufficientFunds,
            PaymentScenario::ExpiredCard,
            PaymentScenario::ProcessingError,
        ]
    }
}
