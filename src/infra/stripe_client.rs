use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::application::ports::billing_provider::{ProviderError, ProviderResult};

pub const STRIPE_API_BASE: &str = "https://api.stripe.com/v1/";

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
    api_base: Url,
}

impl StripeClient {
    pub fn new(secret_key: SecretString, api_base: Url) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            api_base,
        }
    }

    fn auth_header(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:", self.secret_key.expose_secret()));
        format!("Basic {}", encoded)
    }

    fn endpoint(&self, path: &str) -> ProviderResult<Url> {
        self.api_base
            .join(path)
            .map_err(|e| ProviderError::Service(format!("Invalid Stripe URL: {}", e)))
    }

    // ========================================================================
    // Customers
    // ========================================================================

    pub async fn create_customer(
        &self,
        description: &str,
        email: &str,
        source: &SecretString,
        coupon: Option<&str>,
    ) -> ProviderResult<StripeCustomer> {
        let mut params: Vec<(&str, String)> = vec![
            ("description", description.to_string()),
            ("source", source.expose_secret().to_string()),
            ("expand[]", "default_source".to_string()),
        ];
        if !email.is_empty() {
            params.push(("email", email.to_string()));
        }
        if let Some(code) = coupon {
            params.push(("coupon", code.to_string()));
        }

        let request = self.client.post(self.endpoint("customers")?).form(&params);
        self.send(request).await
    }

    pub async fn get_customer(&self, customer_id: &str) -> ProviderResult<StripeCustomer> {
        let request = self
            .client
            .get(self.endpoint(&format!("customers/{}", customer_id))?)
            .query(&[("expand[]", "default_source")]);
        self.send(request).await
    }

    /// Replace the customer's default source with a new card token.
    pub async fn update_customer_source(
        &self,
        customer_id: &str,
        source: &SecretString,
    ) -> ProviderResult<StripeCustomer> {
        let params = [
            ("source", source.expose_secret().to_string()),
            ("expand[]", "default_source".to_string()),
        ];

        let request = self
            .client
            .post(self.endpoint(&format!("customers/{}", customer_id))?)
            .form(&params);
        self.send(request).await
    }

    pub async fn apply_customer_coupon(
        &self,
        customer_id: &str,
        coupon: &str,
    ) -> ProviderResult<StripeCustomer> {
        let request = self
            .client
            .post(self.endpoint(&format!("customers/{}", customer_id))?)
            .form(&[("coupon", coupon)]);
        self.send(request).await
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    /// The customer's current (not cancelled) subscription, if any.
    pub async fn current_subscription(
        &self,
        customer_id: &str,
    ) -> ProviderResult<Option<StripeSubscription>> {
        let request = self
            .client
            .get(self.endpoint("subscriptions")?)
            .query(&[("customer", customer_id), ("limit", "1")]);

        let list: StripeSubscriptionList = self.send(request).await?;
        Ok(list.data.into_iter().next())
    }

    pub async fn create_subscription(
        &self,
        customer_id: &str,
        price_id: &str,
    ) -> ProviderResult<StripeSubscription> {
        let params = [
            ("customer", customer_id),
            ("items[0][price]", price_id),
        ];

        let request = self
            .client
            .post(self.endpoint("subscriptions")?)
            .form(&params);
        self.send(request).await
    }

    /// Switch the subscription's single item to `price_id`; also clears a
    /// scheduled cancellation.
    pub async fn update_subscription(
        &self,
        subscription_id: &str,
        item_id: &str,
        price_id: &str,
        prorate: bool,
    ) -> ProviderResult<StripeSubscription> {
        let proration_behavior = if prorate { "create_prorations" } else { "none" };
        let params = [
            ("items[0][id]", item_id),
            ("items[0][price]", price_id),
            ("proration_behavior", proration_behavior),
            ("cancel_at_period_end", "false"),
        ];

        let request = self
            .client
            .post(self.endpoint(&format!("subscriptions/{}", subscription_id))?)
            .form(&params);
        self.send(request).await
    }

    pub async fn cancel_subscription(
        &self,
        subscription_id: &str,
        at_period_end: bool,
    ) -> ProviderResult<StripeSubscription> {
        let url = self.endpoint(&format!("subscriptions/{}", subscription_id))?;
        let request = if at_period_end {
            // Update to cancel at period end
            self.client
                .post(url)
                .form(&[("cancel_at_period_end", "true")])
        } else {
            // Cancel immediately
            self.client.delete(url)
        };
        self.send(request).await
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        request: RequestBuilder,
    ) -> ProviderResult<T> {
        let response = request
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| ProviderError::Service(format!("Stripe request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::Service(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::error!(status = %status, body = %body, "Stripe API error");

            return Err(match serde_json::from_str::<StripeErrorResponse>(&body) {
                Ok(error) => error.error.into_provider_error(),
                Err(_) => ProviderError::Service(format!("Stripe API error: {} - {}", status, body)),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(body = %body, error = %e, "Failed to parse Stripe response");
            ProviderError::Service(format!("Failed to parse Stripe response: {}", e))
        })
    }
}

// ============================================================================
// Stripe Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StripeCustomer {
    pub id: String,
    pub email: Option<String>,
    pub description: Option<String>,
    pub default_source: Option<StripeSourceRef>,
    pub discount: Option<StripeDiscount>,
}

/// `default_source` is an id unless the request expanded it
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StripeSourceRef {
    Card(StripeCard),
    Id(String),
}

#[derive(Debug, Deserialize)]
pub struct StripeCard {
    pub id: String,
    pub last4: String,
    pub brand: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StripeDiscount {
    pub coupon: StripeCoupon,
}

#[derive(Debug, Deserialize)]
pub struct StripeCoupon {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: String,
    pub status: String,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub items: StripeSubscriptionItems,
}

impl StripeSubscription {
    pub fn first_item(&self) -> Option<&StripeSubscriptionItem> {
        self.items.data.first()
    }

    /// Get the first price ID from the subscription items
    pub fn price_id(&self) -> String {
        self.first_item()
            .map(|item| item.price.id.clone())
            .unwrap_or_default()
    }

    /// Period end of the subscription, falling back to its first item
    pub fn period_end(&self) -> Option<i64> {
        self.current_period_end
            .or_else(|| self.first_item().and_then(|item| item.current_period_end))
    }
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscriptionList {
    pub data: Vec<StripeSubscription>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscriptionItems {
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscriptionItem {
    pub id: String,
    pub price: StripePrice,
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StripePrice {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeErrorResponse {
    pub error: StripeError,
}

#[derive(Debug, Deserialize)]
pub struct StripeError {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: Option<String>,
    pub code: Option<String>,
}

impl StripeError {
    /// `card_error` is the only kind the end user can fix.
    pub fn into_provider_error(self) -> ProviderError {
        let message = self
            .message
            .or(self.code)
            .unwrap_or_else(|| self.error_type.clone());

        match self.error_type.as_str() {
            "card_error" => ProviderError::Declined(message),
            "invalid_request_error" => ProviderError::InvalidRequest(message),
            _ => ProviderError::Service(message),
        }
    }
}
