//! Webhook reconciliation module.
//!
//! The pipeline: raw body + signature header → [`WebhookVerifier`] →
//! [`decode_event`] → [`WebhookProcessor`], which applies idempotent
//! state transitions through the subscription repository.

mod errors;
mod event;
mod processor;
mod verifier;

pub use errors::WebhookError;
pub use event::{decode_event, BillingEvent, EventEnvelope};
pub use processor::{ReconcileOutcome, WebhookProcessor};
pub use verifier::{SignatureHeader, WebhookVerifier};

#[cfg(test)]
pub(crate) use verifier::sign_for_test;
