//! Billing provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Billing provider configuration (API credential + webhook signing secret)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillingConfig {
    /// Provider API key, used to fetch subscription detail on checkout
    pub api_key: String,

    /// Webhook signing secret shared with the provider
    pub webhook_secret: String,

    /// Base URL for the provider API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Timeout for outbound provider calls, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl BillingConfig {
    /// Timeout for outbound provider calls
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Check if using the provider's test mode
    pub fn is_test_mode(&self) -> bool {
        self.api_key.starts_with("sk_test_")
    }

    /// Validate billing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.is_empty() {
            return Err(ValidationError::MissingRequired("BILLING_API_KEY"));
        }
        if self.webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("BILLING_WEBHOOK_SECRET"));
        }

        // Verify key prefixes for safety
        if !self.api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidApiKey);
        }
        if !self.webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidWebhookSecret);
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }

        Ok(())
    }
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_fetch_timeout() -> u64 {
    10
}
