use axum::routing::post;
use axum::Router;

use super::webhook::{handle_billing_webhook, AppState};

/// Webhook routes, nested under `/webhooks` by the caller.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/billing", post(handle_billing_webhook))
}
