//! Wire types for the provider's subscription-detail response.

use chrono::DateTime;
use serde::Deserialize;

use crate::domain::subscription::BillingInterval;
use crate::ports::SubscriptionDetail;

#[derive(Debug, Deserialize)]
pub(super) struct StripeSubscription {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<i64>,
    pub current_period_start: Option<i64>,
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct StripeSubscriptionItems {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StripeSubscriptionItem {
    pub price: StripePrice,
}

#[derive(Debug, Deserialize)]
pub(super) struct StripePrice {
    pub id: String,
    pub recurring: Option<StripeRecurring>,
}

#[derive(Debug, Deserialize)]
pub(super) struct StripeRecurring {
    pub interval: String,
}

impl From<StripeSubscription> for SubscriptionDetail {
    fn from(sub: StripeSubscription) -> Self {
        let first_item = sub.items.data.first();

        SubscriptionDetail {
            external_subscription_id: sub.id,
            price_id: first_item.map(|item| item.price.id.clone()),
            status: sub.status,
            interval: first_item
                .and_then(|item| item.price.recurring.as_ref())
                .and_then(|r| BillingInterval::from_provider(&r.interval)),
            current_period_start: sub
                .current_period_start
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            current_period_end: sub
                .current_period_end
                .and_then(|ts| DateTime::from_timestamp(ts, 0)),
            cancel_at_period_end: sub.cancel_at_period_end,
            canceled_at: sub.canceled_at.and_then(|ts| DateTime::from_timestamp(ts, 0)),
        }
    }
}
