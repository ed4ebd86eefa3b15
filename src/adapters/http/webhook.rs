//! Billing webhook endpoint.
//!
//! The body must be read as raw bytes before any JSON parsing: the
//! signature covers the exact bytes on the wire, so re-serialization
//! would break verification.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::domain::webhook::{decode_event, EventEnvelope, WebhookError, WebhookProcessor, WebhookVerifier};

/// Signature header set by the billing provider.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<WebhookVerifier>,
    pub processor: Arc<WebhookProcessor>,
}

/// Wrapper mapping pipeline errors onto the response contract.
pub struct WebhookApiError(WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let kind = match &self.0 {
            WebhookError::SignatureInvalid => "signature_invalid",
            WebhookError::Decode(_) => "decode_error",
            WebhookError::Repository(_) => "repository_error",
            WebhookError::UpstreamFetch(_) => "upstream_error",
        };

        if status == StatusCode::BAD_REQUEST {
            tracing::warn!(error = %self.0, "webhook rejected");
        } else {
            tracing::error!(error = %self.0, "webhook processing failed");
        }

        (status, Json(json!({ "error": kind }))).into_response()
    }
}

/// POST handler for provider webhook deliveries.
pub async fn handle_billing_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, WebhookApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    state.verifier.verify(&body, signature)?;

    let envelope: EventEnvelope = serde_json::from_slice(&body)
        .map_err(|e| WebhookError::Decode(format!("invalid event envelope: {}", e)))?;

    tracing::debug!(
        event_id = %envelope.id,
        event_type = %envelope.event_type,
        livemode = envelope.livemode,
        "webhook event verified"
    );

    let event = decode_event(&envelope)?;
    let outcome = state.processor.handle(event).await?;

    Ok(Json(json!({ "received": true, "outcome": outcome.as_str() })))
}
