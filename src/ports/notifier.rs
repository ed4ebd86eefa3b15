//! Outbound notification port.
//!
//! Notifications are a fire-and-forget side effect triggered after a
//! state transition commits; they are never part of the reconciliation
//! transaction and their failure must not affect the webhook response.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::subscription::PlanTier;

/// Notification kinds emitted by the reconciliation handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Checkout completed; paid features are now active.
    SubscriptionActivated { user_id: Uuid, plan: PlanTier },

    /// Subscription ended at the provider; plan downgraded to free.
    SubscriptionCancelled { user_id: Uuid },

    /// An invoice payment failed; access will lapse unless resolved.
    PaymentFailed { user_id: Uuid },
}

/// Port for delivering user notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification. Infallible from the caller's view;
    /// implementations log their own delivery failures.
    async fn notify(&self, notification: Notification);
}
