//! Webhook event envelope and decoding.
//!
//! The provider delivers effectively untyped JSON with a discriminant
//! field. We model the result as a closed sum with an explicit
//! `Unhandled` catch-all, decoded via a single dispatch on the
//! discriminant before any field access — no handler ever assumes
//! fields that do not exist for its variant.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use super::errors::WebhookError;
use crate::domain::subscription::BillingInterval;

/// Raw event envelope as received from the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    /// Unique event identifier.
    pub id: String,

    /// Event type discriminant (e.g. "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Unix timestamp when the event was created.
    pub created: i64,

    /// Event payload containing the affected object.
    pub data: EventData,

    /// Whether this is a live or test event.
    #[serde(default)]
    pub livemode: bool,
}

/// Event data container.
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    /// The object that triggered the event (shape depends on type).
    pub object: serde_json::Value,
}

/// Decoded billing event. Each variant carries only the fields its
/// handler needs; the event is discarded after processing.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingEvent {
    CheckoutCompleted {
        session_id: String,
        /// Subscription created by the checkout; absent for one-off
        /// payment sessions.
        external_subscription_id: Option<String>,
        /// Internal user id carried in session metadata.
        user_id: Option<String>,
    },
    SubscriptionUpdated {
        external_subscription_id: String,
        /// Raw provider status string, mapped by the handler.
        status: String,
        price_id: Option<String>,
        interval: Option<BillingInterval>,
        current_period_start: Option<DateTime<Utc>>,
        current_period_end: Option<DateTime<Utc>>,
        cancel_at_period_end: bool,
        canceled_at: Option<DateTime<Utc>>,
    },
    SubscriptionDeleted {
        external_subscription_id: String,
    },
    InvoicePaymentSucceeded {
        invoice_id: String,
        /// Absent for invoices not tied to a subscription (one-off
        /// items); such events cause no repository write.
        external_subscription_id: Option<String>,
    },
    InvoicePaymentFailed {
        invoice_id: String,
        external_subscription_id: Option<String>,
    },
    /// Event type we do not process; acknowledged without effect so the
    /// system stays forward-compatible with new provider event types.
    Unhandled {
        event_type: String,
    },
}

/// Checkout session object (the fields we read).
#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    id: String,
    subscription: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

/// Subscription object (the fields we read).
#[derive(Debug, Deserialize)]
struct SubscriptionObject {
    id: String,
    status: String,
    #[serde(default)]
    cancel_at_period_end: bool,
    canceled_at: Option<i64>,
    current_period_start: Option<i64>,
    current_period_end: Option<i64>,
    #[serde(default)]
    items: SubscriptionItems,
}

#[derive(Debug, Default, Deserialize)]
struct SubscriptionItems {
    #[serde(default)]
    data: Vec<SubscriptionItem>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItem {
    price: PriceObject,
}

#[derive(Debug, Deserialize)]
struct PriceObject {
    id: String,
    recurring: Option<PriceRecurring>,
}

#[derive(Debug, Deserialize)]
struct PriceRecurring {
    interval: String,
}

/// Invoice object (the fields we read).
#[derive(Debug, Deserialize)]
struct InvoiceObject {
    id: String,
    subscription: Option<String>,
}

/// Decode a verified envelope into a typed billing event.
///
/// Unknown event types decode into `Unhandled`. A malformed payload on
/// a *recognized* type is a `Decode` fault so the provider retries
/// rather than the event being silently dropped.
pub fn decode_event(envelope: &EventEnvelope) -> Result<BillingEvent, WebhookError> {
    match envelope.event_type.as_str() {
        "checkout.session.completed" => {
            let session: CheckoutSessionObject = object_as(envelope)?;
            Ok(BillingEvent::CheckoutCompleted {
                session_id: session.id,
                external_subscription_id: session.subscription,
                user_id: session.metadata.get("user_id").cloned(),
            })
        }

        "customer.subscription.updated" => {
            let sub: SubscriptionObject = object_as(envelope)?;
            Ok(subscription_updated(sub))
        }

        "customer.subscription.deleted" => {
            let sub: SubscriptionObject = object_as(envelope)?;
            Ok(BillingEvent::SubscriptionDeleted {
                external_subscription_id: sub.id,
            })
        }

        "invoice.payment_succeeded" => {
            let invoice: InvoiceObject = object_as(envelope)?;
            Ok(BillingEvent::InvoicePaymentSucceeded {
                invoice_id: invoice.id,
                external_subscription_id: invoice.subscription,
            })
        }

        "invoice.payment_failed" => {
            let invoice: InvoiceObject = object_as(envelope)?;
            Ok(BillingEvent::InvoicePaymentFailed {
                invoice_id: invoice.id,
                external_subscription_id: invoice.subscription,
            })
        }

        other => Ok(BillingEvent::Unhandled {
            event_type: other.to_string(),
        }),
    }
}

fn object_as<T: serde::de::DeserializeOwned>(envelope: &EventEnvelope) -> Result<T, WebhookError> {
    serde_json::from_value(envelope.data.object.clone()).map_err(|e| {
        tracing::error!(
            event_id = %envelope.id,
            event_type = %envelope.event_type,
            error = %e,
            "malformed payload for recognized event type"
        );
        WebhookError::Decode(format!("{}: {}", envelope.event_type, e))
    })
}

fn subscription_updated(sub: SubscriptionObject) -> BillingEvent {
    let first_item = sub.items.data.first();
    let price_id = first_item.map(|item| item.price.id.clone());
    let interval = first_item
        .and_then(|item| item.price.recurring.as_ref())
        .and_then(|r| BillingInterval::from_provider(&r.interval));

    BillingEvent::SubscriptionUpdated {
        external_subscription_id: sub.id,
        status: sub.status,
        price_id,
        interval,
        current_period_start: sub.current_period_start.and_then(ts_to_datetime),
        current_period_end: sub.current_period_end.and_then(ts_to_datetime),
        cancel_at_period_end: sub.cancel_at_period_end,
        canceled_at: sub.canceled_at.and_then(ts_to_datetime),
    }
}

fn ts_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}
