use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::entities::payment_provider::PaymentProvider;

// ============================================================================
// Port Types - Provider-agnostic domain types
// ============================================================================

/// Identifier of the remote billing account (a "customer" in Stripe terms)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored payment method on a remote account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSource {
    pub id: String,
    pub last4: String,
    pub brand: Option<String>,
}

/// Remote billing account as reported by the provider
#[derive(Debug, Clone, Serialize)]
pub struct RemoteAccount {
    pub id: AccountId,
    /// The payment method charged unless another one is given per charge
    pub default_source: Option<PaymentSource>,
    /// Coupon code currently applied to the account
    pub coupon: Option<String>,
}

/// Remote subscription held by a billing account
#[derive(Debug, Clone, Serialize)]
pub struct RemoteSubscription {
    pub id: String,
    pub remote_plan_id: String,
    pub status: String,
    pub cancel_at_period_end: bool,
    pub current_period_end: Option<DateTime<Utc>>,
}

/// The single plan line of a remote subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionItem {
    pub id: String,
    pub remote_plan_id: String,
}

/// Everything needed to open a remote billing account
#[derive(Debug, Clone)]
pub struct NewAccountRequest {
    pub description: String,
    pub email: String,
    /// One-time card token obtained client-side
    pub card_token: SecretString,
    pub coupon_code: Option<String>,
}

/// Failure kinds reported by a billing provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Payment failure the user can correct (declined card, insufficient funds, ...)
    #[error("{0}")]
    Declined(String),

    /// The request itself was wrong (unknown coupon, missing subscription, ...)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Transient or provider-side failure
    #[error("service error: {0}")]
    Service(String),
}

impl ProviderError {
    pub fn is_declined(&self) -> bool {
        matches!(self, ProviderError::Declined(_))
    }

    /// The provider's own wording, suitable for showing to the user.
    pub fn message(&self) -> &str {
        match self {
            ProviderError::Declined(m)
            | ProviderError::InvalidRequest(m)
            | ProviderError::Service(m) => m,
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

// ============================================================================
// Billing Provider Port
// ============================================================================

/// Remote operations the synchronization engine needs from a billing provider.
///
/// Every call is attempted exactly once; retries and timeouts belong to the
/// implementation's transport.
#[async_trait]
pub trait BillingProviderPort: Send + Sync {
    /// Get the provider type
    fn provider(&self) -> PaymentProvider;

    /// Open a remote account with the card token as its default source.
    async fn create_account(&self, request: &NewAccountRequest) -> ProviderResult<RemoteAccount>;

    async fn retrieve_account(&self, account: &AccountId) -> ProviderResult<RemoteAccount>;

    /// Replace the account's default source and return the new one.
    async fn update_default_source(
        &self,
        account: &AccountId,
        card_token: &SecretString,
    ) -> ProviderResult<PaymentSource>;

    /// Create the account's subscription, or switch the existing one to `remote_plan_id`.
    /// Updating an existing subscription also clears a scheduled cancellation.
    async fn update_subscription(
        &self,
        account: &AccountId,
        remote_plan_id: &str,
        prorate: bool,
    ) -> ProviderResult<RemoteSubscription>;

    /// Cancel now, or schedule cancellation at the end of the current period.
    async fn cancel_subscription(
        &self,
        account: &AccountId,
        at_period_end: bool,
    ) -> ProviderResult<RemoteSubscription>;

    /// Attach a coupon to the account, by code.
    async fn apply_coupon(&self, account: &AccountId, code: &str) -> ProviderResult<RemoteAccount>;

    async fn retrieve_subscription_item(
        &self,
        account: &AccountId,
    ) -> ProviderResult<SubscriptionItem>;
}
