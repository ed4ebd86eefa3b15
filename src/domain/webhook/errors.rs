//! Webhook error taxonomy.
//!
//! Every fault in the pipeline maps to one of two HTTP responses: 400
//! for signature problems (never retried by the provider) and 500 for
//! processing faults (retried with backoff). Benign conditions — lookup
//! misses, unhandled event types, invoices without a subscription —
//! are not errors and never reach this type.

use axum::http::StatusCode;
use thiserror::Error;

use crate::ports::{ProviderError, RepositoryError};

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature header missing, malformed, or failed verification.
    /// The variants are deliberately not distinguished to the caller.
    #[error("invalid webhook signature")]
    SignatureInvalid,

    /// A recognized event type carried an unparsable payload.
    #[error("malformed event payload: {0}")]
    Decode(String),

    /// Database unavailable or write failed mid-transition.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// The subscription-detail fetch failed or timed out during
    /// checkout completion.
    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(#[from] ProviderError),
}

impl WebhookError {
    /// Returns true if the provider should retry delivery.
    ///
    /// The provider retries on 5xx. A truly malformed payload will not
    /// change between retries, but surfacing decode faults as retryable
    /// keeps decoder bugs from being silently swallowed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, WebhookError::SignatureInvalid)
    }

    /// HTTP status code for the response contract.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::SignatureInvalid => StatusCode::BAD_REQUEST,
            WebhookError::Decode(_)
            | WebhookError::Repository(_)
            | WebhookError::UpstreamFetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_failure_is_bad_request() {
        assert_eq!(
            WebhookError::SignatureInvalid.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert!(!WebhookError::SignatureInvalid.is_retryable());
    }

    #[test]
    fn decode_failure_is_server_error() {
        let err = WebhookError::Decode("bad json".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_retryable());
    }

    #[test]
    fn repository_failure_is_server_error() {
        let err = WebhookError::Repository(RepositoryError::Database("down".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_retryable());
    }

    #[test]
    fn upstream_fetch_failure_is_server_error() {
        let err = WebhookError::UpstreamFetch(ProviderError::Network("timeout".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_retryable());
    }

    #[test]
    fn errors_carry_context_in_display() {
        let err = WebhookError::UpstreamFetch(ProviderError::NotFound("sub_42".to_string()));
        assert!(err.to_string().contains("sub_42"));
    }
}
