use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use secrecy::SecretString;
use url::Url;

use crate::{
    application::ports::billing_provider::{
        AccountId, BillingProviderPort, NewAccountRequest, PaymentSource, ProviderError,
        ProviderResult, RemoteAccount, RemoteSubscription, SubscriptionItem,
    },
    domain::entities::payment_provider::PaymentProvider,
    infra::stripe_client::{StripeClient, StripeCustomer, StripeSourceRef, StripeSubscription},
};

/// Adapter that wraps StripeClient to implement BillingProviderPort.
///
/// A remote account is a Stripe customer holding at most one subscription
/// with a single item.
#[derive(Clone)]
pub struct StripeBillingAdapter {
    client: StripeClient,
}

impl StripeBillingAdapter {
    pub fn new(secret_key: SecretString, api_base: Url) -> Self {
        Self {
            client: StripeClient::new(secret_key, api_base),
        }
    }

    /// Convert timestamp to DateTime<Utc>
    fn timestamp_to_datetime(ts: i64) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(ts, 0).single()
    }

    fn to_remote_account(customer: StripeCustomer) -> RemoteAccount {
        let default_source = match customer.default_source {
            Some(StripeSourceRef::Card(card)) => Some(PaymentSource {
                id: card.id,
                last4: card.last4,
                brand: card.brand,
            }),
            Some(StripeSourceRef::Id(_)) | None => None,
        };

        RemoteAccount {
            id: AccountId::new(customer.id),
            default_source,
            coupon: customer.discount.map(|d| d.coupon.id),
        }
    }

    fn to_remote_subscription(subscription: StripeSubscription) -> RemoteSubscription {
        RemoteSubscription {
            remote_plan_id: subscription.price_id(),
            current_period_end: subscription
                .period_end()
                .and_then(Self::timestamp_to_datetime),
            id: subscription.id,
            status: subscription.status,
            cancel_at_period_end: subscription.cancel_at_period_end,
        }
    }

    async fn require_subscription(&self, account: &AccountId) -> ProviderResult<StripeSubscription> {
        self.client
            .current_subscription(account.as_str())
            .await?
            .ok_or_else(|| {
                ProviderError::InvalidRequest(format!(
                    "Customer {} has no active subscription",
                    account
                ))
            })
    }
}

#[async_trait]
impl BillingProviderPort for StripeBillingAdapter {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Stripe
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    async fn create_account(&self, request: &NewAccountRequest) -> ProviderResult<RemoteAccount> {
        let customer = self
            .client
            .create_customer(
                &request.description,
                &request.email,
                &request.card_token,
                request.coupon_code.as_deref(),
            )
            .await?;

        tracing::debug!(customer_id = %customer.id, "Stripe customer created");
        Ok(Self::to_remote_account(customer))
    }

    async fn retrieve_account(&self, account: &AccountId) -> ProviderResult<RemoteAccount> {
        let customer = self.client.get_customer(account.as_str()).await?;
        Ok(Self::to_remote_account(customer))
    }

    async fn update_default_source(
        &self,
        account: &AccountId,
        card_token: &SecretString,
    ) -> ProviderResult<PaymentSource> {
        let customer = self
            .client
            .update_customer_source(account.as_str(), card_token)
            .await?;

        Self::to_remote_account(customer)
            .default_source
            .ok_or_else(|| ProviderError::Service("Stripe returned no default source".into()))
    }

    async fn apply_coupon(&self, account: &AccountId, code: &str) -> ProviderResult<RemoteAccount> {
        let customer = self
            .client
            .apply_customer_coupon(account.as_str(), code)
            .await?;
        Ok(Self::to_remote_account(customer))
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    async fn update_subscription(
        &self,
        account: &AccountId,
        remote_plan_id: &str,
        prorate: bool,
    ) -> ProviderResult<RemoteSubscription> {
        let existing = self.client.current_subscription(account.as_str()).await?;

        let subscription = match existing
            .as_ref()
            .and_then(|s| s.first_item().map(|item| (s.id.as_str(), item.id.as_str())))
        {
            Some((subscription_id, item_id)) => {
                self.client
                    .update_subscription(subscription_id, item_id, remote_plan_id, prorate)
                    .await?
            }
            None => {
                self.client
                    .create_subscription(account.as_str(), remote_plan_id)
                    .await?
            }
        };

        tracing::debug!(
            customer_id = %account,
            subscription_id = %subscription.id,
            price_id = %remote_plan_id,
            "Stripe subscription updated"
        );
        Ok(Self::to_remote_subscription(subscription))
    }

    async fn cancel_subscription(
        &self,
        account: &AccountId,
        at_period_end: bool,
    ) -> ProviderResult<RemoteSubscription> {
        let subscription = self.require_subscription(account).await?;
        let cancelled = self
            .client
            .cancel_subscription(&subscription.id, at_period_end)
            .await?;
        Ok(Self::to_remote_subscription(cancelled))
    }

    async fn retrieve_subscription_item(
        &self,
        account: &AccountId,
    ) -> ProviderResult<SubscriptionItem> {
        let subscription = self.require_subscription(account).await?;
        subscription
            .first_item()
            .map(|item| SubscriptionItem {
                id: item.id.clone(),
                remote_plan_id: item.price.id.clone(),
            })
            .ok_or_else(|| {
                ProviderError::InvalidRequest(format!(
                    "Subscription {} has no items",
                    subscription.id
                ))
            })
    }
}
