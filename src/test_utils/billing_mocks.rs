//! Scripted billing provider for exercising the synchronization engine.

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::{
    application::ports::billing_provider::{
        AccountId, BillingProviderPort, NewAccountRequest, PaymentSource, ProviderError,
        ProviderResult, RemoteAccount, RemoteSubscription, SubscriptionItem,
    },
    domain::entities::payment_provider::PaymentProvider,
    test_utils::{TEST_ACCOUNT_ID, test_period_end},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAccount,
    RetrieveAccount,
    UpdateDefaultSource,
    UpdateSubscription,
    CancelSubscription,
    ApplyCoupon,
    RetrieveSubscriptionItem,
}

/// One recorded provider call with the arguments worth asserting on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    CreateAccount {
        description: String,
        email: String,
        coupon_code: Option<String>,
    },
    RetrieveAccount {
        account: String,
    },
    UpdateDefaultSource {
        account: String,
    },
    UpdateSubscription {
        account: String,
        remote_plan_id: String,
        prorate: bool,
    },
    CancelSubscription {
        account: String,
        at_period_end: bool,
    },
    ApplyCoupon {
        account: String,
        code: String,
    },
    RetrieveSubscriptionItem {
        account: String,
    },
}

impl ProviderCall {
    pub fn operation(&self) -> Operation {
        match self {
            ProviderCall::CreateAccount { .. } => Operation::CreateAccount,
            ProviderCall::RetrieveAccount { .. } => Operation::RetrieveAccount,
            ProviderCall::UpdateDefaultSource { .. } => Operation::UpdateDefaultSource,
            ProviderCall::UpdateSubscription { .. } => Operation::UpdateSubscription,
            ProviderCall::CancelSubscription { .. } => Operation::CancelSubscription,
            ProviderCall::ApplyCoupon { .. } => Operation::ApplyCoupon,
            ProviderCall::RetrieveSubscriptionItem { .. } => Operation::RetrieveSubscriptionItem,
        }
    }
}

// ============================================================================
// ScriptedBillingProvider
// ============================================================================

/// Succeeds on every call unless a failure was injected for the operation.
/// Failures stay in place for every later call of that operation.
pub struct ScriptedBillingProvider {
    calls: Mutex<Vec<ProviderCall>>,
    failures: Mutex<HashMap<Operation, ProviderError>>,
    subscribed_plan: Mutex<Option<String>>,
    last4: String,
    source_on_create: bool,
}

impl Default for ScriptedBillingProvider {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            subscribed_plan: Mutex::new(None),
            last4: "4242".to_string(),
            source_on_create: true,
        }
    }
}

impl ScriptedBillingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last four digits of every card the provider accepts.
    pub fn with_last4(mut self, last4: &str) -> Self {
        self.last4 = last4.to_string();
        self
    }

    /// `create_account` answers without the default source.
    pub fn without_default_source_on_create(mut self) -> Self {
        self.source_on_create = false;
        self
    }

    pub fn fail_on(&self, operation: Operation, error: ProviderError) {
        self.failures.lock().unwrap().insert(operation, error);
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.calls().iter().map(ProviderCall::operation).collect()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.operations()
            .into_iter()
            .filter(|op| *op == operation)
            .count()
    }

    fn record(&self, call: ProviderCall) -> ProviderResult<()> {
        let operation = call.operation();
        self.calls.lock().unwrap().push(call);
        match self.failures.lock().unwrap().get(&operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn source(&self) -> PaymentSource {
        PaymentSource {
            id: "card_test".to_string(),
            last4: self.last4.clone(),
            brand: Some("Visa".to_string()),
        }
    }

    fn account(&self, id: &str, with_source: bool) -> RemoteAccount {
        RemoteAccount {
            id: AccountId::new(id),
            default_source: with_source.then(|| self.source()),
            coupon: None,
        }
    }

    fn remote_subscription(&self, remote_plan_id: String, cancel_at_period_end: bool) -> RemoteSubscription {
        RemoteSubscription {
            id: "sub_test".to_string(),
            remote_plan_id,
            status: "active".to_string(),
            cancel_at_period_end,
            current_period_end: Some(test_period_end()),
        }
    }

    fn current_plan(&self) -> String {
        self.subscribed_plan
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| "price_basic".to_string())
    }
}

#[async_trait]
impl BillingProviderPort for ScriptedBillingProvider {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Dummy
    }

    async fn create_account(&self, request: &NewAccountRequest) -> ProviderResult<RemoteAccount> {
        self.record(ProviderCall::CreateAccount {
            description: request.description.clone(),
            email: request.email.clone(),
            coupon_code: request.coupon_code.clone(),
        })?;
        Ok(self.account(TEST_ACCOUNT_ID, self.source_on_create))
    }

    async fn retrieve_account(&self, account: &AccountId) -> ProviderResult<RemoteAccount> {
        self.record(ProviderCall::RetrieveAccount {
            account: account.to_string(),
        })?;
        Ok(self.account(account.as_str(), true))
    }

    async fn update_default_source(
        &self,
        account: &AccountId,
        _card_token: &SecretString,
    ) -> ProviderResult<PaymentSource> {
        self.record(ProviderCall::UpdateDefaultSource {
            account: account.to_string(),
        })?;
        Ok(self.source())
    }

    async fn update_subscription(
        &self,
        account: &AccountId,
        remote_plan_id: &str,
        prorate: bool,
    ) -> ProviderResult<RemoteSubscription> {
        self.record(ProviderCall::UpdateSubscription {
            account: account.to_string(),
            remote_plan_id: remote_plan_id.to_string(),
            prorate,
        })?;
        *self.subscribed_plan.lock().unwrap() = Some(remote_plan_id.to_string());
        Ok(self.remote_subscription(remote_plan_id.to_string(), false))
    }

    async fn cancel_subscription(
        &self,
        account: &AccountId,
        at_period_end: bool,
    ) -> ProviderResult<RemoteSubscription> {
        self.record(ProviderCall::CancelSubscription {
            account: account.to_string(),
            at_period_end,
        })?;
        Ok(self.remote_subscription(self.current_plan(), at_period_end))
    }

    async fn apply_coupon(&self, account: &AccountId, code: &str) -> ProviderResult<RemoteAccount> {
        self.record(ProviderCall::ApplyCoupon {
            account: account.to_string(),
            code: code.to_string(),
        })?;
        let mut remote = self.account(account.as_str(), true);
        remote.coupon = Some(code.to_string());
        Ok(remote)
    }

    async fn retrieve_subscription_item(
        &self,
        account: &AccountId,
    ) -> ProviderResult<SubscriptionItem> {
        self.record(ProviderCall::RetrieveSubscriptionItem {
            account: account.to_string(),
        })?;
        Ok(SubscriptionItem {
            id: "si_test".to_string(),
            remote_plan_id: self.current_plan(),
        })
    }
}
