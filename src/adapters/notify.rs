//! Logging notifier.
//!
//! Notification delivery (email templates, push) lives in another
//! service; this adapter records the intent in structured logs so the
//! reconciliation engine has a complete pipeline without owning
//! delivery. Notifications fire after the subscription write commits
//! and their failure never affects the webhook response.

use async_trait::async_trait;

use crate::ports::{Notification, Notifier};

pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) {
        match notification {
            Notification::SubscriptionActivated { user_id, plan } => {
                tracing::info!(%user_id, %plan, "notify: subscription activated");
            }
            Notification::SubscriptionCancelled { user_id } => {
                tracing::info!(%user_id, "notify: subscription cancelled");
            }
            Notification::PaymentFailed { user_id } => {
                tracing::info!(%user_id, "notify: payment failed");
            }
        }
    }
}
