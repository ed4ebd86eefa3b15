//! Subscription repository port.
//!
//! Sole writer of subscription state. All writes are single-row,
//! single-statement operations keyed by the `user_id` unique constraint
//! (upsert) or by `external_subscription_id` (updates), so the
//! create-vs-update race lands on the storage engine's atomic upsert
//! rather than on application-level locking.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::subscription::{BillingInterval, PlanTier, Subscription, SubscriptionStatus};

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database unavailable or statement failed.
    #[error("database error: {0}")]
    Database(String),

    /// Stored data could not be mapped back onto domain types.
    #[error("corrupt subscription row: {0}")]
    Corrupt(String),
}

/// Fields written by the checkout-completion upsert.
#[derive(Debug, Clone)]
pub struct CheckoutUpsert {
    pub user_id: Uuid,
    pub external_subscription_id: String,

    /// `None` when the price id did not resolve to a known tier; the
    /// upsert must then keep an existing row's plan unchanged.
    pub plan: Option<PlanTier>,

    pub interval: Option<BillingInterval>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
}

/// Partial update applied by the update/invoice handlers.
///
/// Only set fields are written; `None` means "leave the stored value
/// untouched". Invoice handlers set `status` alone — plan and interval
/// are owned by checkout/update events and must not be clobbered by
/// invoice events.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub status: Option<SubscriptionStatus>,
    pub plan: Option<PlanTier>,
    pub interval: Option<BillingInterval>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: Option<bool>,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl StatusUpdate {
    /// Update touching status only, for invoice events.
    pub fn status_only(status: SubscriptionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

/// Port for subscription persistence.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Look up the subscription for a user, if any.
    async fn find_by_user_id(&self, user_id: Uuid)
        -> Result<Option<Subscription>, RepositoryError>;

    /// Look up a subscription by the provider's id.
    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Subscription>, RepositoryError>;

    /// Create-or-update the row for a completed checkout, atomically,
    /// keyed on the `user_id` unique constraint. Sets status to active.
    async fn upsert_on_checkout(
        &self,
        upsert: CheckoutUpsert,
    ) -> Result<Subscription, RepositoryError>;

    /// Apply a partial update to the row with the given external id.
    ///
    /// Returns `false` when no row matched — the caller treats that as a
    /// benign lookup miss, not an error.
    async fn update_status(
        &self,
        external_id: &str,
        update: StatusUpdate,
    ) -> Result<bool, RepositoryError>;

    /// Force the row with the given external id to cancelled/free.
    ///
    /// Returns `false` when no row matched.
    async fn downgrade_to_free(&self, external_id: &str) -> Result<bool, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SubscriptionRepository) {}
    }

    #[test]
    fn status_only_update_leaves_other_fields_unset() {
        let update = StatusUpdate::status_only(SubscriptionStatus::Active);
        assert_eq!(update.status, Some(SubscriptionStatus::Active));
        assert!(update.plan.is_none());
        assert!(update.interval.is_none());
        assert!(update.current_period_start.is_none());
        assert!(update.cancel_at_period_end.is_none());
    }
}
