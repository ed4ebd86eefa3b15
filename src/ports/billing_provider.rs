//! Billing provider port.
//!
//! The provider is the system of record for payment state. This port
//! covers the single outbound call the reconciliation engine makes:
//! fetching full subscription detail after a checkout completes. The
//! client is constructed once at startup and passed in explicitly so
//! the boundary is mockable and has no hidden initialization order.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::subscription::BillingInterval;

/// Errors from provider API calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection failure or timeout.
    #[error("provider request failed: {0}")]
    Network(String),

    /// Non-success response from the provider API.
    #[error("provider API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be parsed.
    #[error("failed to parse provider response: {0}")]
    Parse(String),

    /// The subscription does not exist at the provider.
    #[error("subscription {0} not found at provider")]
    NotFound(String),
}

/// Full subscription detail fetched from the provider.
#[derive(Debug, Clone)]
pub struct SubscriptionDetail {
    pub external_subscription_id: String,

    /// Price id of the first subscription item, if any.
    pub price_id: Option<String>,

    /// Raw provider status string.
    pub status: String,

    pub interval: Option<BillingInterval>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<DateTime<Utc>>,
}

/// Port for the billing provider API.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Fetch full subscription detail by the provider's id.
    ///
    /// Implementations must apply a bounded timeout; a timeout surfaces
    /// as `ProviderError::Network`, never as a partial result.
    async fn fetch_subscription(
        &self,
        external_id: &str,
    ) -> Result<SubscriptionDetail, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn BillingProvider) {}
    }

    #[test]
    fn errors_display_with_context() {
        let err = ProviderError::Api {
            status: 503,
            message: "upstream unavailable".to_string(),
        };
        assert!(err.to_string().contains("503"));

        let err = ProviderError::NotFound("sub_123".to_string());
        assert!(err.to_string().contains("sub_123"));
    }
}
