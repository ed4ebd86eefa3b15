//! Subscription record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BillingInterval, PlanTier, SubscriptionStatus};

/// Local subscription record, one row per user.
///
/// Owned exclusively by the subscription repository; mutated only by
/// the webhook reconciliation handlers. Never deleted — cancellation is
/// a status/plan transition, not row removal. Other subsystems read it
/// to gate feature access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,

    /// Owning user; unique — at most one subscription per user.
    pub user_id: Uuid,

    /// Identifier assigned by the billing provider, stable once set.
    /// A free subscription has no meaningful external id.
    pub external_subscription_id: Option<String>,

    pub plan: PlanTier,

    pub status: SubscriptionStatus,

    /// `None` when the plan is free.
    pub interval: Option<BillingInterval>,

    /// Bounds of the paid period; read by feature-gating code.
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,

    /// Distinct from `status`: an active subscription with this flag set
    /// will not renew at period end.
    pub cancel_at_period_end: bool,

    /// When cancellation was requested at the provider.
    pub canceled_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Returns true if the stored state already reflects a completed
    /// checkout — used by the idempotency guard to skip re-applying a
    /// duplicate checkout event.
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A paid, active subscription for handler tests.
    pub fn active_subscription(user_id: Uuid, external_id: &str, plan: PlanTier) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            user_id,
            external_subscription_id: Some(external_id.to_string()),
            plan,
            status: SubscriptionStatus::Active,
            interval: Some(BillingInterval::Monthly),
            current_period_start: Some(now),
            current_period_end: Some(now + chrono::Duration::days(30)),
            cancel_at_period_end: false,
            canceled_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
