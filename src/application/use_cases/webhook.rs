use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{billing_provider::AccountId, hooks::SubscriptionHooks},
    domain::entities::subscription::Subscription,
};

// ============================================================================
// Event Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingEventKind {
    /// `customer.subscription.deleted`
    SubscriptionDeleted,
    /// `invoice.payment_succeeded`, with the invoice total
    PaymentSucceeded { amount_cents: i64 },
    /// `charge.failed`
    ChargeFailed,
    /// `charge.dispute.created`
    ChargeDisputed,
    Other(String),
}

/// An already-authenticated event pushed by the billing provider.
#[derive(Debug, Clone, Serialize)]
pub struct BillingEvent {
    pub id: String,
    /// Remote account the event belongs to, when the payload names one
    pub account: Option<AccountId>,
    pub kind: BillingEventKind,
}

impl BillingEvent {
    /// Parse a provider event payload (`{"id", "type", "data": {"object": ..}}`).
    pub fn from_json(event: &JsonValue) -> AppResult<Self> {
        let event_type = event["type"]
            .as_str()
            .ok_or_else(|| AppError::InvalidInput("Missing event type".into()))?;
        let id = event["id"].as_str().unwrap_or_default().to_string();
        let object = &event["data"]["object"];

        let kind = match event_type {
            "customer.subscription.deleted" => BillingEventKind::SubscriptionDeleted,
            "invoice.payment_succeeded" => BillingEventKind::PaymentSucceeded {
                amount_cents: object["total"]
                    .as_i64()
                    .or_else(|| object["amount_paid"].as_i64())
                    .ok_or_else(|| AppError::InvalidInput("Missing invoice total".into()))?,
            },
            "charge.failed" => BillingEventKind::ChargeFailed,
            "charge.dispute.created" => BillingEventKind::ChargeDisputed,
            other => BillingEventKind::Other(other.to_string()),
        };

        let account = object["customer"].as_str().map(AccountId::new);

        Ok(Self { id, account, kind })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookOutcome {
    Handled,
    Ignored,
}

// ============================================================================
// Finalizer
// ============================================================================

/// Turns remote billing events into local effects and hook calls.
///
/// Looking up the subscription for the event's account, checking the event's
/// authenticity and persisting the record afterwards are left to the caller.
#[derive(Clone)]
pub struct WebhookFinalizer {
    hooks: Arc<dyn SubscriptionHooks>,
}

impl WebhookFinalizer {
    pub fn new(hooks: Arc<dyn SubscriptionHooks>) -> Self {
        Self { hooks }
    }

    pub async fn finalize(
        &self,
        event: &BillingEvent,
        subscription: &mut Subscription,
    ) -> WebhookOutcome {
        if let (Some(event_account), Some(account)) =
            (event.account.as_ref(), subscription.remote_account_id.as_ref())
        {
            if event_account != account {
                tracing::warn!(
                    event_id = %event.id,
                    event_account = %event_account,
                    account_id = %account,
                    "Billing event belongs to another account, ignoring"
                );
                return WebhookOutcome::Ignored;
            }
        }

        match &event.kind {
            BillingEventKind::SubscriptionDeleted => {
                subscription.end_from_remote();
                tracing::info!(
                    event_id = %event.id,
                    subscription_id = %subscription.id,
                    "Subscription ended by provider"
                );
                self.hooks.finalize_cancelation(subscription).await;
            }
            BillingEventKind::PaymentSucceeded { amount_cents } => {
                tracing::info!(
                    event_id = %event.id,
                    subscription_id = %subscription.id,
                    amount_cents,
                    "Payment succeeded"
                );
                self.hooks
                    .payment_succeeded(subscription, *amount_cents)
                    .await;
            }
            BillingEventKind::ChargeFailed => {
                tracing::warn!(
                    event_id = %event.id,
                    subscription_id = %subscription.id,
                    "Charge failed"
                );
                self.hooks.charge_failed(subscription).await;
            }
            BillingEventKind::ChargeDisputed => {
                tracing::warn!(
                    event_id = %event.id,
                    subscription_id = %subscription.id,
                    "Charge disputed"
                );
                self.hooks.charge_disputed(subscription).await;
            }
            BillingEventKind::Other(event_type) => {
                tracing::debug!(event_id = %event.id, event_type = %event_type, "Unhandled billing event");
                return WebhookOutcome::Ignored;
            }
        }

        WebhookOutcome::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use serde_json::json;

    fn event(event_type: &str, object: JsonValue) -> BillingEvent {
        BillingEvent::from_json(&json!({
            "id": "evt_123",
            "type": event_type,
            "data": { "object": object }
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_invoice_event() {
        let parsed = event(
            "invoice.payment_succeeded",
            json!({ "customer": "cus_existing", "total": 2999 }),
        );

        assert_eq!(parsed.id, "evt_123");
        assert_eq!(parsed.account, Some(AccountId::new("cus_existing")));
        assert_eq!(
            parsed.kind,
            BillingEventKind::PaymentSucceeded { amount_cents: 2999 }
        );
    }

    #[test]
    fn test_parse_rejects_missing_type_and_total() {
        assert!(matches!(
            BillingEvent::from_json(&json!({ "id": "evt_1" })),
            Err(AppError::InvalidInput(_))
        ));
        assert!(BillingEvent::from_json(&json!({
            "id": "evt_2",
            "type": "invoice.payment_succeeded",
            "data": { "object": { "customer": "cus_existing" } }
        }))
        .is_err());
    }

    #[test]
    fn test_parse_unknown_event() {
        let parsed = event("customer.updated", json!({}));
        assert_eq!(
            parsed.kind,
            BillingEventKind::Other("customer.updated".to_string())
        );
        assert!(parsed.account.is_none());
    }

    #[tokio::test]
    async fn test_subscription_deleted_ends_subscription() {
        let hooks = Arc::new(RecordingHooks::new());
        let finalizer = WebhookFinalizer::new(hooks.clone());
        let basic = create_test_plan("basic", 1, 999);
        let mut sub = create_active_subscription(&basic, |s| {
            s.cancel_at_period_end = true;
            s.current_period_end = Some(test_period_end());
        });

        let outcome = finalizer
            .finalize(
                &event("customer.subscription.deleted", json!({ "customer": EXISTING_ACCOUNT_ID })),
                &mut sub,
            )
            .await;

        assert_eq!(outcome, WebhookOutcome::Handled);
        assert!(!sub.is_subscribed());
        assert!(sub.current_price_cents.is_none());
        assert!(!sub.cancel_at_period_end);
        assert!(!sub.is_changing_plans());
        assert_eq!(sub.remote_account_id, Some(AccountId::new(EXISTING_ACCOUNT_ID)));
        assert_eq!(hooks.events(), vec!["finalize_cancelation"]);
    }

    #[tokio::test]
    async fn test_payment_events_map_to_hooks() {
        let hooks = Arc::new(RecordingHooks::new());
        let finalizer = WebhookFinalizer::new(hooks.clone());
        let basic = create_test_plan("basic", 1, 999);
        let mut sub = create_active_subscription(&basic, |_| {});

        for (event_type, object) in [
            ("invoice.payment_succeeded", json!({ "total": 999 })),
            ("charge.failed", json!({ "customer": EXISTING_ACCOUNT_ID })),
            ("charge.dispute.created", json!({ "charge": "ch_1" })),
        ] {
            let outcome = finalizer.finalize(&event(event_type, object), &mut sub).await;
            assert_eq!(outcome, WebhookOutcome::Handled);
        }

        assert_eq!(
            hooks.events(),
            vec!["payment_succeeded", "charge_failed", "charge_disputed"]
        );
        assert_eq!(hooks.payment_amounts(), vec![999]);
        assert!(sub.is_subscribed());
    }

    #[tokio::test]
    async fn test_unknown_and_foreign_events_are_ignored() {
        let hooks = Arc::new(RecordingHooks::new());
        let finalizer = WebhookFinalizer::new(hooks.clone());
        let basic = create_test_plan("basic", 1, 999);
        let mut sub = create_active_subscription(&basic, |_| {});

        let unknown = finalizer
            .finalize(&event("customer.updated", json!({})), &mut sub)
            .await;
        let foreign = finalizer
            .finalize(
                &event("customer.subscription.deleted", json!({ "customer": "cus_other" })),
                &mut sub,
            )
            .await;

        assert_eq!(unknown, WebhookOutcome::Ignored);
        assert_eq!(foreign, WebhookOutcome::Ignored);
        assert!(sub.is_subscribed());
        assert!(hooks.events().is_empty());
    }
}
