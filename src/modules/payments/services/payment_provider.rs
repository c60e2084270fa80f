use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use tracing::{debug, error};

use crate::core::{AppError, Result, Secret};

/// Transient provider failures are retried this many times
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    pub order_id: i64,
    pub user_id: i64,
    /// Smallest currency unit
    pub amount: i64,
    pub currency: String,
    /// Repeating a request with the same key returns the original intent
    pub idempotency_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: i64,
}

/// External payment processor
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_intent(&self, request: &IntentRequest) -> Result<ProviderIntent>;

    fn name(&self) -> &str;
}

/// Stripe payment intents over the REST API
pub struct StripeProvider {
    client: ClientWithMiddleware,
    secret_key: Secret<String>,
    api_base: String,
}

impl StripeProvider {
    pub fn new(secret_key: Secret<String>, api_base: impl Into<String>) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            secret_key,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_intent(&self, request: &IntentRequest) -> Result<ProviderIntent> {
        let url = format!("{}/v1/payment_intents", self.api_base);

        let form = [
            ("amount", request.amount.to_string()),
            ("currency", request.currency.clone()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[order_id]", request.order_id.to_string()),
            ("metadata[user_id]", request.user_id.to_string()),
        ];

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.secret_key.reveal())
            .header("Idempotency-Key", &request.idempotency_key)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(order_id = request.order_id, status = %status, "Payment intent creation rejected");
            return Err(AppError::gateway(format!("Stripe API error {}: {}", status, body)));
        }

        let intent: ProviderIntent = response
            .json()
            .await
            .map_err(|e| AppError::gateway(format!("Failed to parse Stripe response: {}", e)))?;

        debug!(order_id = request.order_id, payment_intent = %intent.id, "Payment intent created");

        Ok(intent)
    }

    fn name(&self) -> &str {
        "stripe"
    }
}
