//! PostgreSQL implementation of the subscription repository.
//!
//! Every write is a single statement. The checkout upsert is keyed by
//! the unique constraint on `user_id`, so two concurrent deliveries
//! racing to create the row resolve inside Postgres rather than in
//! application code. Partial updates use COALESCE so unset fields keep
//! their stored values.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::subscription::{BillingInterval, PlanTier, Subscription, SubscriptionStatus};
use crate::ports::{CheckoutUpsert, RepositoryError, StatusUpdate, SubscriptionRepository};

pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Raw database row, mapped onto the domain type via `TryFrom` so
/// string codec failures surface as `Corrupt` instead of panicking.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    external_subscription_id: Option<String>,
    plan: String,
    status: String,
    billing_interval: Option<String>,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    cancel_at_period_end: bool,
    canceled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = RepositoryError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let plan = PlanTier::parse(&row.plan)
            .ok_or_else(|| RepositoryError::Corrupt(format!("unknown plan '{}'", row.plan)))?;
        let status = SubscriptionStatus::parse(&row.status)
            .ok_or_else(|| RepositoryError::Corrupt(format!("unknown status '{}'", row.status)))?;
        let interval = match row.billing_interval.as_deref() {
            Some(raw) => Some(BillingInterval::parse(raw).ok_or_else(|| {
                RepositoryError::Corrupt(format!("unknown interval '{}'", raw))
            })?),
            None => None,
        };

        Ok(Subscription {
            id: row.id,
            user_id: row.user_id,
            external_subscription_id: row.external_subscription_id,
            plan,
            status,
            interval,
            current_period_start: row.current_period_start,
            current_period_end: row.current_period_end,
            cancel_at_period_end: row.cancel_at_period_end,
            canceled_at: row.canceled_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, user_id, external_subscription_id, plan, status, \
     billing_interval, current_period_start, current_period_end, \
     cancel_at_period_end, canceled_at, created_at, updated_at";

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1",
            SELECT_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Subscription>, RepositoryError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE external_subscription_id = $1",
            SELECT_COLUMNS
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(Subscription::try_from).transpose()
    }

    async fn upsert_on_checkout(
        &self,
        upsert: CheckoutUpsert,
    ) -> Result<Subscription, RepositoryError> {
        // A fresh row with an unresolved plan lands on 'free' and is
        // corrected by the subsequent subscription.updated event; an
        // existing row keeps its stored plan.
        let row: SubscriptionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO subscriptions
                (id, user_id, external_subscription_id, plan, status, billing_interval,
                 current_period_start, current_period_end, cancel_at_period_end,
                 canceled_at, created_at, updated_at)
            VALUES ($1, $2, $3, COALESCE($4, 'free'), 'active', $5, $6, $7, FALSE,
                    NULL, NOW(), NOW())
            ON CONFLICT (user_id) DO UPDATE SET
                external_subscription_id = EXCLUDED.external_subscription_id,
                plan = COALESCE($4, subscriptions.plan),
                status = 'active',
                billing_interval = COALESCE($5, subscriptions.billing_interval),
                current_period_start = COALESCE($6, subscriptions.current_period_start),
                current_period_end = COALESCE($7, subscriptions.current_period_end),
                cancel_at_period_end = FALSE,
                canceled_at = NULL,
                updated_at = NOW()
            RETURNING {}
            "#,
            SELECT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(upsert.user_id)
        .bind(&upsert.external_subscription_id)
        .bind(upsert.plan.map(|p| p.as_str()))
        .bind(upsert.interval.map(|i| i.as_str()))
        .bind(upsert.current_period_start)
        .bind(upsert.current_period_end)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Subscription::try_from(row)
    }

    async fn update_status(
        &self,
        external_id: &str,
        update: StatusUpdate,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = COALESCE($2, status),
                plan = COALESCE($3, plan),
                billing_interval = COALESCE($4, billing_interval),
                current_period_start = COALESCE($5, current_period_start),
                current_period_end = COALESCE($6, current_period_end),
                cancel_at_period_end = COALESCE($7, cancel_at_period_end),
                canceled_at = COALESCE($8, canceled_at),
                updated_at = NOW()
            WHERE external_subscription_id = $1
            "#,
        )
        .bind(external_id)
        .bind(update.status.map(|s| s.as_str()))
        .bind(update.plan.map(|p| p.as_str()))
        .bind(update.interval.map(|i| i.as_str()))
        .bind(update.current_period_start)
        .bind(update.current_period_end)
        .bind(update.cancel_at_period_end)
        .bind(update.canceled_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn downgrade_to_free(&self, external_id: &str) -> Result<bool, RepositoryError> {
        // Clearing the external id makes stale post-deletion events for
        // this subscription miss the row instead of resurrecting it.
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = 'cancelled',
                plan = 'free',
                billing_interval = NULL,
                external_subscription_id = NULL,
                cancel_at_period_end = FALSE,
                canceled_at = NOW(),
                updated_at = NOW()
            WHERE external_subscription_id = $1
            "#,
        )
        .bind(external_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(plan: &str, status: &str, interval: Option<&str>) -> SubscriptionRow {
        let now = Utc::now();
        SubscriptionRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            external_subscription_id: Some("sub_123".to_string()),
            plan: plan.to_string(),
            status: status.to_string(),
            billing_interval: interval.map(str::to_string),
            current_period_start: Some(now),
            current_period_end: Some(now),
            cancel_at_period_end: false,
            canceled_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_maps_onto_domain_type() {
        let sub = Subscription::try_from(row("premium", "past_due", Some("yearly"))).unwrap();
        assert_eq!(sub.plan, PlanTier::Premium);
        assert_eq!(sub.status, SubscriptionStatus::PastDue);
        assert_eq!(sub.interval, Some(BillingInterval::Yearly));
    }

    #[test]
    fn free_row_without_interval_maps() {
        let sub = Subscription::try_from(row("free", "cancelled", None)).unwrap();
        assert_eq!(sub.plan, PlanTier::Free);
        assert!(sub.interval.is_none());
    }

    #[test]
    fn unknown_codes_are_corrupt_rows() {
        assert!(matches!(
            Subscription::try_from(row("gold", "active", None)),
            Err(RepositoryError::Corrupt(_))
        ));
        assert!(matches!(
            Subscription::try_from(row("basic", "suspended", None)),
            Err(RepositoryError::Corrupt(_))
        ));
        assert!(matches!(
            Subscription::try_from(row("basic", "active", Some("weekly"))),
            Err(RepositoryError::Corrupt(_))
        ));
    }
}
