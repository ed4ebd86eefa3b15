//! Reconciliation dispatcher.
//!
//! Routes each decoded billing event to the handler owning that event
//! family. Handlers write only the fields their event type owns: plan
//! and interval belong to checkout/update events, invoice events touch
//! status alone. Notifications fire after the write commits and are
//! never part of the reconciliation path.

use std::sync::Arc;

use crate::domain::subscription::{resolve_plan, SubscriptionStatus};
use crate::ports::{
    BillingProvider, CheckoutUpsert, Notification, Notifier, StatusUpdate, SubscriptionRepository,
};

use super::errors::WebhookError;
use super::event::BillingEvent;

/// What a successfully processed event did. Every variant is an
/// acknowledgment; benign no-ops are outcomes, not errors, so the
/// provider stops retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Checkout applied, row created or reactivated.
    Activated,
    /// Checkout skipped, row already active.
    AlreadyActive,
    /// Subscription fields updated.
    Updated,
    /// Subscription cancelled and downgraded to free.
    Cancelled,
    /// Paid invoice recorded, status set to active.
    PaymentRecorded,
    /// Failed invoice recorded, status set to expired.
    PaymentFailed,
    /// No local row matched the external id.
    NoMatchingSubscription,
    /// Invoice not tied to a subscription.
    NotSubscriptionInvoice,
    /// Event type we do not process.
    Unhandled,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Activated => "activated",
            Self::AlreadyActive => "already_active",
            Self::Updated => "updated",
            Self::Cancelled => "cancelled",
            Self::PaymentRecorded => "payment_recorded",
            Self::PaymentFailed => "payment_failed",
            Self::NoMatchingSubscription => "no_matching_subscription",
            Self::NotSubscriptionInvoice => "not_subscription_invoice",
            Self::Unhandled => "unhandled",
        }
    }
}

/// Applies decoded billing events to local subscription state.
pub struct WebhookProcessor {
    repository: Arc<dyn SubscriptionRepository>,
    provider: Arc<dyn BillingProvider>,
    notifier: Arc<dyn Notifier>,
}

impl WebhookProcessor {
    pub fn new(
        repository: Arc<dyn SubscriptionRepository>,
        provider: Arc<dyn BillingProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            repository,
            provider,
            notifier,
        }
    }

    /// Dispatch one event to its handler.
    pub async fn handle(&self, event: BillingEvent) -> Result<ReconcileOutcome, WebhookError> {
        match event {
            BillingEvent::CheckoutCompleted {
                session_id,
                external_subscription_id,
                user_id,
            } => {
                self.handle_checkout_completed(&session_id, external_subscription_id, user_id)
                    .await
            }

            BillingEvent::SubscriptionUpdated {
                external_subscription_id,
                status,
                price_id,
                interval,
                current_period_start,
                current_period_end,
                cancel_at_period_end,
                canceled_at,
            } => {
                self.handle_subscription_updated(
                    &external_subscription_id,
                    &status,
                    price_id.as_deref(),
                    StatusUpdate {
                        status: None,
                        plan: None,
                        interval,
                        current_period_start,
                        current_period_end,
                        cancel_at_period_end: Some(cancel_at_period_end),
                        canceled_at,
                    },
                )
                .await
            }

            BillingEvent::SubscriptionDeleted {
                external_subscription_id,
            } => {
                self.handle_subscription_deleted(&external_subscription_id)
                    .await
            }

            BillingEvent::InvoicePaymentSucceeded {
                invoice_id,
                external_subscription_id,
            } => {
                self.handle_invoice_payment_succeeded(&invoice_id, external_subscription_id)
                    .await
            }

            BillingEvent::InvoicePaymentFailed {
                invoice_id,
                external_subscription_id,
            } => {
                self.handle_invoice_payment_failed(&invoice_id, external_subscription_id)
                    .await
            }

            BillingEvent::Unhandled { event_type } => {
                tracing::debug!(event_type = %event_type, "ignoring unhandled event type");
                Ok(ReconcileOutcome::Unhandled)
            }
        }
    }

    /// Checkout completion. The one handler that contacts the provider:
    /// the checkout session does not carry plan or period detail, so
    /// the full subscription object is fetched before the upsert.
    async fn handle_checkout_completed(
        &self,
        session_id: &str,
        external_subscription_id: Option<String>,
        user_id: Option<String>,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let user_id = user_id
            .as_deref()
            .and_then(|raw| uuid::Uuid::parse_str(raw).ok())
            .ok_or_else(|| {
                WebhookError::Decode(format!(
                    "checkout session {} has no usable user_id in metadata",
                    session_id
                ))
            })?;

        let external_id = external_subscription_id.ok_or_else(|| {
            WebhookError::Decode(format!(
                "checkout session {} has no subscription reference",
                session_id
            ))
        })?;

        // Duplicate delivery guard, derived from stored state. An
        // already-active row means a prior delivery committed; skip the
        // provider fetch and the re-write entirely.
        if let Some(existing) = self.repository.find_by_user_id(user_id).await? {
            if existing.status == SubscriptionStatus::Active {
                tracing::info!(
                    user_id = %user_id,
                    external_id = %external_id,
                    "subscription already active, skipping duplicate checkout event"
                );
                return Ok(ReconcileOutcome::AlreadyActive);
            }
        }

        let detail = self.provider.fetch_subscription(&external_id).await?;

        let plan = detail.price_id.as_deref().and_then(resolve_plan);
        if plan.is_none() {
            tracing::warn!(
                external_id = %external_id,
                price_id = ?detail.price_id,
                "price id did not resolve to a known plan, leaving plan unchanged"
            );
        }

        let subscription = self
            .repository
            .upsert_on_checkout(CheckoutUpsert {
                user_id,
                external_subscription_id: external_id.clone(),
                plan,
                interval: detail.interval,
                current_period_start: detail.current_period_start,
                current_period_end: detail.current_period_end,
            })
            .await?;

        tracing::info!(
            user_id = %user_id,
            external_id = %external_id,
            plan = %subscription.plan,
            "subscription activated from checkout"
        );

        self.notifier
            .notify(Notification::SubscriptionActivated {
                user_id,
                plan: subscription.plan,
            })
            .await;

        Ok(ReconcileOutcome::Activated)
    }

    async fn handle_subscription_updated(
        &self,
        external_id: &str,
        raw_status: &str,
        price_id: Option<&str>,
        mut update: StatusUpdate,
    ) -> Result<ReconcileOutcome, WebhookError> {
        update.status = SubscriptionStatus::from_provider(raw_status);
        if update.status.is_none() {
            tracing::warn!(
                external_id = %external_id,
                status = %raw_status,
                "unmapped provider status, leaving stored status unchanged"
            );
        }

        update.plan = price_id.and_then(resolve_plan);
        if price_id.is_some() && update.plan.is_none() {
            tracing::warn!(
                external_id = %external_id,
                price_id = ?price_id,
                "price id did not resolve to a known plan, leaving plan unchanged"
            );
        }

        let matched = self.repository.update_status(external_id, update).await?;
        if !matched {
            tracing::info!(
                external_id = %external_id,
                "no subscription row for update event, acknowledging without write"
            );
            return Ok(ReconcileOutcome::NoMatchingSubscription);
        }

        tracing::info!(external_id = %external_id, status = %raw_status, "subscription updated");
        Ok(ReconcileOutcome::Updated)
    }

    async fn handle_subscription_deleted(
        &self,
        external_id: &str,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let Some(existing) = self.repository.find_by_external_id(external_id).await? else {
            tracing::info!(
                external_id = %external_id,
                "no subscription row for delete event, acknowledging without write"
            );
            return Ok(ReconcileOutcome::NoMatchingSubscription);
        };

        self.repository.downgrade_to_free(external_id).await?;

        tracing::info!(
            user_id = %existing.user_id,
            external_id = %external_id,
            "subscription cancelled and downgraded to free"
        );

        self.notifier
            .notify(Notification::SubscriptionCancelled {
                user_id: existing.user_id,
            })
            .await;

        Ok(ReconcileOutcome::Cancelled)
    }

    async fn handle_invoice_payment_succeeded(
        &self,
        invoice_id: &str,
        external_subscription_id: Option<String>,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let Some(external_id) = external_subscription_id else {
            tracing::debug!(invoice_id = %invoice_id, "invoice has no subscription reference");
            return Ok(ReconcileOutcome::NotSubscriptionInvoice);
        };

        let matched = self
            .repository
            .update_status(&external_id, StatusUpdate::status_only(SubscriptionStatus::Active))
            .await?;
        if !matched {
            tracing::info!(
                external_id = %external_id,
                invoice_id = %invoice_id,
                "no subscription row for paid invoice, acknowledging without write"
            );
            return Ok(ReconcileOutcome::NoMatchingSubscription);
        }

        tracing::info!(external_id = %external_id, invoice_id = %invoice_id, "invoice paid");
        Ok(ReconcileOutcome::PaymentRecorded)
    }

    async fn handle_invoice_payment_failed(
        &self,
        invoice_id: &str,
        external_subscription_id: Option<String>,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let Some(external_id) = external_subscription_id else {
            tracing::debug!(invoice_id = %invoice_id, "invoice has no subscription reference");
            return Ok(ReconcileOutcome::NotSubscriptionInvoice);
        };

        let Some(existing) = self.repository.find_by_external_id(&external_id).await? else {
            tracing::info!(
                external_id = %external_id,
                invoice_id = %invoice_id,
                "no subscription row for failed invoice, acknowledging without write"
            );
            return Ok(ReconcileOutcome::NoMatchingSubscription);
        };

        self.repository
            .update_status(&external_id, StatusUpdate::status_only(SubscriptionStatus::Expired))
            .await?;

        tracing::warn!(
            user_id = %existing.user_id,
            external_id = %external_id,
            invoice_id = %invoice_id,
            "invoice payment failed, subscription expired"
        );

        self.notifier
            .notify(Notification::PaymentFailed {
                user_id: existing.user_id,
            })
            .await;

        Ok(ReconcileOutcome::PaymentFailed)
    }
}
