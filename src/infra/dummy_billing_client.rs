use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::{
    application::ports::billing_provider::{
        AccountId, BillingProviderPort, NewAccountRequest, PaymentSource, ProviderError,
        ProviderResult, RemoteAccount, RemoteSubscription, SubscriptionItem,
    },
    domain::entities::{payment_provider::PaymentProvider, payment_scenario::PaymentScenario},
};

const BILLING_PERIOD_DAYS: i64 = 30;

#[derive(Debug, Clone)]
struct DummyAccount {
    source: PaymentSource,
    coupon: Option<String>,
    subscription: Option<RemoteSubscription>,
}

impl DummyAccount {
    fn to_remote(&self, id: &str) -> RemoteAccount {
        RemoteAccount {
            id: AccountId::new(id),
            default_source: Some(self.source.clone()),
            coupon: self.coupon.clone(),
        }
    }
}

/// Dummy billing provider for local runs.
///
/// Accounts live in memory. The outcome of every card operation is chosen by
/// the [`PaymentScenario`] behind the card token (Stripe's test tokens), so
/// `tok_chargeDeclined` behaves like a declined card.
#[derive(Default)]
pub struct DummyBillingClient {
    accounts: Mutex<HashMap<String, DummyAccount>>,
}

impl DummyBillingClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn accounts(&self) -> ProviderResult<MutexGuard<'_, HashMap<String, DummyAccount>>> {
        self.accounts
            .lock()
            .map_err(|_| ProviderError::Service("Dummy provider state is poisoned".into()))
    }

    /// Validate a card token and build the payment source it stands for.
    fn process_card(card_token: &SecretString) -> ProviderResult<PaymentSource> {
        let scenario = PaymentScenario::from_card_token(card_token.expose_secret());
        if let Some(message) = scenario.error_message() {
            return Err(ProviderError::Declined(message.to_string()));
        }

        Ok(PaymentSource {
            id: format!("dummy_card_{}", Uuid::new_v4()),
            last4: scenario.last4().to_string(),
            brand: Some("Visa".to_string()),
        })
    }

    fn no_such_customer(account: &AccountId) -> ProviderError {
        ProviderError::InvalidRequest(format!("No such customer: '{}'", account))
    }

    fn no_subscription(account: &AccountId) -> ProviderError {
        ProviderError::InvalidRequest(format!("Customer {} has no active subscription", account))
    }
}

#[async_trait]
impl BillingProviderPort for DummyBillingClient {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Dummy
    }

    async fn create_account(&self, request: &NewAccountRequest) -> ProviderResult<RemoteAccount> {
        let source = Self::process_card(&request.card_token)?;
        let id = format!("dummy_cus_{}", Uuid::new_v4());
        let account = DummyAccount {
            source,
            coupon: request.coupon_code.clone(),
            subscription: None,
        };

        let remote = account.to_remote(&id);
        self.accounts()?.insert(id.clone(), account);

        tracing::debug!(account_id = %id, description = %request.description, "Dummy account created");
        Ok(remote)
    }

    async fn retrieve_account(&self, account: &AccountId) -> ProviderResult<RemoteAccount> {
        self.accounts()?
            .get(account.as_str())
            .map(|a| a.to_remote(account.as_str()))
            .ok_or_else(|| Self::no_such_customer(account))
    }

    async fn update_default_source(
        &self,
        account: &AccountId,
        card_token: &SecretString,
    ) -> ProviderResult<PaymentSource> {
        let mut accounts = self.accounts()?;
        let entry = accounts
            .get_mut(account.as_str())
            .ok_or_else(|| Self::no_such_customer(account))?;

        let source = Self::process_card(card_token)?;
        entry.source = source.clone();
        Ok(source)
    }

    async fn update_subscription(
        &self,
        account: &AccountId,
        remote_plan_id: &str,
        _prorate: bool,
    ) -> ProviderResult<RemoteSubscription> {
        let mut accounts = self.accounts()?;
        let entry = accounts
            .get_mut(account.as_str())
            .ok_or_else(|| Self::no_such_customer(account))?;

        let subscription = match entry.subscription.take() {
            Some(existing) => RemoteSubscription {
                remote_plan_id: remote_plan_id.to_string(),
                cancel_at_period_end: false,
                ..existing
            },
            None => RemoteSubscription {
                id: format!("dummy_sub_{}", Uuid::new_v4()),
                remote_plan_id: remote_plan_id.to_string(),
                status: "active".to_string(),
                cancel_at_period_end: false,
                current_period_end: Some(Utc::now() + Duration::days(BILLING_PERIOD_DAYS)),
            },
        };

        entry.subscription = Some(subscription.clone());
        Ok(subscription)
    }

    async fn cancel_subscription(
        &self,
        account: &AccountId,
        at_period_end: bool,
    ) -> ProviderResult<RemoteSubscription> {
        let mut accounts = self.accounts()?;
        let entry = accounts
            .get_mut(account.as_str())
            .ok_or_else(|| Self::no_such_customer(account))?;

        if at_period_end {
            let subscription = entry
                .subscription
                .as_mut()
                .ok_or_else(|| Self::no_subscription(account))?;
            subscription.cancel_at_period_end = true;
            return Ok(subscription.clone());
        }

        let mut subscription = entry
            .subscription
            .take()
            .ok_or_else(|| Self::no_subscription(account))?;
        subscription.status = "canceled".to_string();
        Ok(subscription)
    }

    async fn apply_coupon(&self, account: &AccountId, code: &str) -> ProviderResult<RemoteAccount> {
        if code.trim().is_empty() {
            return Err(ProviderError::InvalidRequest("Coupon code is empty".into()));
        }

        let mut accounts = self.accounts()?;
        let entry = accounts
            .get_mut(account.as_str())
            .ok_or_else(|| Self::no_such_customer(account))?;
        entry.coupon = Some(code.to_string());
        Ok(entry.to_remote(account.as_str()))
    }

    async fn retrieve_subscription_item(
        &self,
        account: &AccountId,
    ) -> ProviderResult<SubscriptionItem> {
        let accounts = self.accounts()?;
        let subscription = accounts
            .get(account.as_str())
            .ok_or_else(|| Self::no_such_customer(account))?
            .subscription
            .as_ref()
            .ok_or_else(|| Self::no_subscription(account))?;

        Ok(SubscriptionItem {
            id: format!("{}_item", subscription.id),
            remote_plan_id: subscription.remote_plan_id.clone(),
        })
    }
}
