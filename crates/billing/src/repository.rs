//! Subscription persistence
//!
//! One logical row per real-world subscriber, reconciled from webhook events.
//! Freemius payloads populate identifiers inconsistently, so upserts target a
//! fallback sequence of natural keys: `subscription_id`, then `license_id`,
//! then `user_email`. A row is never dropped for lacking a preferred key.

use serde::Serialize;
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::plans::PlanKey;
use crate::status::SubscriptionStatus;

/// Conflict targets for the keyed upsert, in priority order.
const UPSERT_KEYS: [&str; 3] = ["subscription_id", "license_id", "user_email"];

/// A persisted subscription row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SubscriptionRecord {
    pub id: Uuid,
    pub user_email: Option<String>,
    pub user_id: Option<String>,
    pub license_id: Option<String>,
    pub subscription_id: Option<String>,
    pub plan_id: Option<String>,
    pub plan_key: Option<String>,
    pub status: Option<String>,
    /// Provider-supplied renewal timestamp, stored verbatim (Freemius does
    /// not guarantee a single timestamp format across event types).
    pub renews_at: Option<String>,
    pub transformations_limit: Option<i32>,
    pub transformations_used: i32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_event_at: Option<OffsetDateTime>,
    pub raw_payload: Option<Json<Value>>,
}

/// The reconciled state derived from one webhook event, ready to persist.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_email: Option<String>,
    pub user_id: Option<String>,
    pub license_id: Option<String>,
    pub subscription_id: Option<String>,
    pub plan_id: String,
    pub plan_key: Option<PlanKey>,
    pub status: SubscriptionStatus,
    pub renews_at: Option<String>,
    pub transformations_limit: Option<i32>,
    pub raw_payload: Value,
}

impl NewSubscription {
    /// Natural keys usable as the upsert conflict target, in priority order.
    /// Null keys are skipped.
    pub fn conflict_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::with_capacity(UPSERT_KEYS.len());
        if self.subscription_id.is_some() {
            keys.push(UPSERT_KEYS[0]);
        }
        if self.license_id.is_some() {
            keys.push(UPSERT_KEYS[1]);
        }
        if self.user_email.is_some() {
            keys.push(UPSERT_KEYS[2]);
        }
        keys
    }
}

/// Repository over the subscriptions table.
///
/// Constructed without a pool when store credentials are absent: writes then
/// become logged no-ops and reads return empty results, rather than failing
/// at startup.
#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: Option<PgPool>,
    table: String,
}

impl SubscriptionRepository {
    pub fn new(pool: Option<PgPool>, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.pool.is_some()
    }

    /// Idempotently persist a reconciled subscription.
    ///
    /// Tries each usable conflict key in priority order; a failed keyed
    /// upsert is logged and the next key is tried. When every keyed upsert
    /// fails (or no key is usable), falls back to a plain insert so the
    /// event is not silently dropped. Never returns an error: the webhook
    /// path must acknowledge the provider regardless of persistence outcome.
    pub async fn upsert(&self, record: &NewSubscription) {
        let Some(pool) = &self.pool else {
            tracing::info!(
                user_email = ?record.user_email,
                subscription_id = ?record.subscription_id,
                plan_id = %record.plan_id,
                status = %record.status,
                "store not configured - skipping subscription upsert"
            );
            return;
        };

        let last_event_at = OffsetDateTime::now_utc();

        for key in record.conflict_keys() {
            match self.upsert_on(pool, record, key, last_event_at).await {
                Ok(()) => {
                    tracing::debug!(
                        conflict_key = key,
                        status = %record.status,
                        "subscription upserted"
                    );
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        conflict_key = key,
                        error = %e,
                        "subscription upsert failed - trying next key"
                    );
                }
            }
        }

        if let Err(e) = self.insert(pool, record, last_event_at).await {
            tracing::error!(
                user_email = ?record.user_email,
                error = %e,
                "subscription insert failed after exhausting conflict keys - event dropped from store"
            );
        }
    }

    async fn upsert_on(
        &self,
        pool: &PgPool,
        record: &NewSubscription,
        conflict_key: &str,
        last_event_at: OffsetDateTime,
    ) -> BillingResult<()> {
        // transformations_used is intentionally absent from the update set:
        // usage must survive webhook replays and plan changes
        let sql = format!(
            r#"
            INSERT INTO {table} (
                user_email, user_id, license_id, subscription_id, plan_id, plan_key,
                status, renews_at, transformations_limit, last_event_at, raw_payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT ({key}) DO UPDATE SET
                user_email = EXCLUDED.user_email,
                user_id = EXCLUDED.user_id,
                license_id = EXCLUDED.license_id,
                subscription_id = EXCLUDED.subscription_id,
                plan_id = EXCLUDED.plan_id,
                plan_key = EXCLUDED.plan_key,
                status = EXCLUDED.status,
                renews_at = EXCLUDED.renews_at,
                transformations_limit = EXCLUDED.transformations_limit,
                last_event_at = EXCLUDED.last_event_at,
                raw_payload = EXCLUDED.raw_payload
            "#,
            table = self.table,
            key = conflict_key,
        );

        self.bind_record(sqlx::query(&sql), record, last_event_at)
            .execute(pool)
            .await?;
        Ok(())
    }

    async fn insert(
        &self,
        pool: &PgPool,
        record: &NewSubscription,
        last_event_at: OffsetDateTime,
    ) -> BillingResult<()> {
        let sql = format!(
            r#"
            INSERT INTO {table} (
                user_email, user_id, license_id, subscription_id, plan_id, plan_key,
                status, renews_at, transformations_limit, last_event_at, raw_payload
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
            table = self.table,
        );

        self.bind_record(sqlx::query(&sql), record, last_event_at)
            .execute(pool)
            .await?;
        Ok(())
    }

    fn bind_record<'q>(
        &self,
        query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
        record: &'q NewSubscription,
        last_event_at: OffsetDateTime,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
        query
            .bind(record.user_email.as_deref())
            .bind(record.user_id.as_deref())
            .bind(record.license_id.as_deref())
            .bind(record.subscription_id.as_deref())
            .bind(&record.plan_id)
            .bind(record.plan_key.map(|k| k.as_str()))
            .bind(record.status.as_str())
            .bind(record.renews_at.as_deref())
            .bind(record.transformations_limit)
            .bind(last_event_at)
            .bind(Json(&record.raw_payload))
    }

    /// Fetch the subscription row for an email, `Ok(None)` when absent or
    /// when the store is not configured.
    pub async fn get_by_email(&self, email: &str) -> BillingResult<Option<SubscriptionRecord>> {
        let Some(pool) = &self.pool else {
            return Ok(None);
        };

        let sql = format!("SELECT * FROM {} WHERE user_email = $1", self.table);
        let record = sqlx::query_as::<_, SubscriptionRecord>(&sql)
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(record)
    }

    /// Count one transformation against the subscriber's quota.
    ///
    /// Read-check-write: two concurrent increments for the same user can
    /// both observe the pre-increment count and both succeed, over-granting
    /// one unit. Accepted at this traffic volume; a stricter store-layer
    /// conditional update would close the race.
    pub async fn increment_usage(&self, email: &str) -> BillingResult<SubscriptionRecord> {
        let pool = self
            .pool
            .as_ref()
            .ok_or(BillingError::StoreNotConfigured)?;

        let sub = self
            .get_by_email(email)
            .await?
            .ok_or_else(|| BillingError::SubscriptionNotFound(email.to_string()))?;

        let used = sub.transformations_used;
        let limit = sub.transformations_limit.unwrap_or(0);
        if limit > 0 && used >= limit {
            return Err(BillingError::QuotaExceeded { used, limit });
        }

        let sql = format!(
            "UPDATE {} SET transformations_used = $1 WHERE id = $2 RETURNING *",
            self.table
        );
        let updated = sqlx::query_as::<_, SubscriptionRecord>(&sql)
            .bind(used + 1)
            .bind(sub.id)
            .fetch_one(pool)
            .await?;
        Ok(updated)
    }
}
