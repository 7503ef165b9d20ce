use dotenvy::dotenv;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use subscription_sync::{
    application::use_cases::{
        synchronization::SubscriptionSyncUseCases,
        webhook::{BillingEvent, WebhookOutcome},
    },
    domain::entities::{
        payment_scenario::PaymentScenario,
        plan::Plan,
        subscription::{Subscription, SubscriptionOwner},
    },
    infra::{
        config::AppConfig,
        setup::{init_billing_services, init_tracing},
        tracing_hooks::TracingHooks,
    },
};

/// Synchronize one step of the walkthrough and log what happened.
async fn run_step(
    use_cases: &SubscriptionSyncUseCases,
    subscription: &mut Subscription,
    step: &str,
) -> anyhow::Result<()> {
    let report = use_cases.synchronize(subscription).await?;

    info!(
        step,
        report = %serde_json::to_string(&report)?,
        plan = ?subscription.plan.as_ref().map(|p| p.code()),
        price_cents = ?subscription.current_price_cents,
        last_four = ?subscription.last_four,
        cancel_at_period_end = subscription.cancel_at_period_end,
        "Synchronized"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let services = init_billing_services(&config, Arc::new(TracingHooks))?;
    let use_cases = &services.sync_use_cases;

    let basic = Plan::new(Uuid::new_v4(), "basic", "Basic", 1, 999, "price_basic");
    let pro = Plan::new(Uuid::new_v4(), "pro", "Pro", 2, 2_999, "price_pro");

    let mut subscription = Subscription::new(SubscriptionOwner {
        id: "demo-owner".to_string(),
        name: Some("Demo Owner".to_string()),
        email: Some("demo@example.com".to_string()),
    });

    info!(
        difference = ?subscription.describe_difference(&basic, use_cases.config()),
        "Starting walkthrough"
    );

    subscription.select_plan(Some(basic.clone()));
    subscription.attach_card_token(PaymentScenario::Success.test_token());
    run_step(use_cases, &mut subscription, "subscribe").await?;

    info!(
        difference = ?subscription.describe_difference(&pro, use_cases.config()),
        "Switching to pro"
    );
    subscription.select_plan(Some(pro.clone()));
    run_step(use_cases, &mut subscription, "upgrade").await?;

    subscription.cancel(false, use_cases.config());
    run_step(use_cases, &mut subscription, "cancel").await?;

    if subscription.cancel_at_period_end {
        subscription.reactivate();
        run_step(use_cases, &mut subscription, "reactivate").await?;
    } else {
        // Immediate cancellation keeps the remote account; subscribe again on it
        subscription.select_plan(Some(pro.clone()));
        run_step(use_cases, &mut subscription, "resubscribe").await?;
    }

    subscription.attach_card_token("tok_mastercard");
    run_step(use_cases, &mut subscription, "card update").await?;

    subscription.attach_card_token(PaymentScenario::Decline.test_token());
    match use_cases.synchronize(&mut subscription).await {
        Err(e) if e.is_user_correctable() => {
            warn!(error = %e, errors = ?subscription.errors, "Declined card was rejected")
        }
        other => {
            other?;
        }
    }

    let payment = BillingEvent::from_json(&json!({
        "id": "evt_demo_payment",
        "type": "invoice.payment_succeeded",
        "data": { "object": {
            "customer": subscription.remote_account_id.as_ref().map(|a| a.to_string()),
            "total": pro.price_cents(),
        }}
    }))?;
    let outcome = services
        .webhook_finalizer
        .finalize(&payment, &mut subscription)
        .await;
    info!(event = %payment.id, ?outcome, "Billing event finalized");

    subscription.cancel(true, use_cases.config());
    run_step(use_cases, &mut subscription, "forced cancel").await?;

    let deleted = BillingEvent::from_json(&json!({
        "id": "evt_demo_deleted",
        "type": "customer.subscription.deleted",
        "data": { "object": {} }
    }))?;
    if services
        .webhook_finalizer
        .finalize(&deleted, &mut subscription)
        .await
        == WebhookOutcome::Handled
    {
        info!(subscribed = subscription.is_subscribed(), "Walkthrough finished");
    }

    Ok(())
}
