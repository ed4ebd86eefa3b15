//! Stripe API client for fetching subscription detail.
//!
//! Constructed once at startup and injected as `Arc<dyn BillingProvider>`
//! so the outbound boundary stays mockable. The timeout is set on the
//! underlying HTTP client, so a hung provider call surfaces as a
//! `Network` error instead of stalling the webhook request.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};

use crate::config::BillingConfig;
use crate::ports::{BillingProvider, ProviderError, SubscriptionDetail};

use super::types::StripeSubscription;

pub struct StripeBillingClient {
    http: Client,
    api_key: SecretString,
    base_url: String,
}

impl StripeBillingClient {
    pub fn new(config: &BillingConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(config.fetch_timeout())
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_key: SecretString::new(config.api_key.clone()),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl BillingProvider for StripeBillingClient {
    async fn fetch_subscription(
        &self,
        external_id: &str,
    ) -> Result<SubscriptionDetail, ProviderError> {
        let url = format!("{}/v1/subscriptions/{}", self.base_url, external_id);

        let response = self
            .http
            .get(&url)
            .basic_auth(self.api_key.expose_secret(), None::<&str>)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ProviderError::NotFound(external_id.to_string())),
            status if !status.is_success() => {
                let message = response.text().await.unwrap_or_default();
                Err(ProviderError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
            _ => {
                let subscription: StripeSubscription = response
                    .json()
                    .await
                    .map_err(|e| ProviderError::Parse(e.to_string()))?;
                Ok(subscription.into())
            }
        }
    }
}
