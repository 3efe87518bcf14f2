mod raw_postgres_reminder;

use self::raw_postgres_reminder::RawPostgresReminder;
use crate::{
    config::DatabaseConfig,
    database::{
        CancelResult, ClaimedReminder, ReminderClaim, ReminderStore, clamp_list_limit,
        truncate_error,
    },
    reminders::{NewReminder, Reminder, ReminderId, ReminderStatus},
};
use anyhow::{Context, bail};
use async_trait::async_trait;
use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

/// Reminder store backed by a PostgreSQL server.
#[derive(Clone, Debug)]
pub struct PostgresReminderStore {
    pool: PgPool,
}

impl PostgresReminderStore {
    /// Connects to the database specified in the config.
    pub async fn open(config: &DatabaseConfig) -> anyhow::Result<Self> {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .database(&config.name);
        if let Some(ref password) = config.password {
            options = options.password(password);
        }

        let pool = PgPoolOptions::new()
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "Cannot connect to database {} at {}:{}.",
                    config.name, config.host, config.port
                )
            })?;

        Self::create(pool).await
    }

    /// Creates the store on top of an existing pool and applies pending migrations.
    pub async fn create(pool: PgPool) -> anyhow::Result<Self> {
        sqlx::migrate!("./migrations/postgres")
            .run(&pool)
            .await
            .with_context(|| "Failed to migrate database")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl ReminderStore for PostgresReminderStore {
    async fn insert(&self, reminder: NewReminder, now: OffsetDateTime) -> anyhow::Result<Reminder> {
        let id = ReminderId::new();
        sqlx::query_as::<_, RawPostgresReminder>(
            r#"
INSERT INTO reminders (id, title, message, target_at, payload, status, attempt_count, next_attempt_at, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, 'pending', 0, $4, $6, $6)
RETURNING *
        "#,
        )
        .bind(*id)
        .bind(reminder.title)
        .bind(reminder.message)
        .bind(reminder.target_at)
        .bind(reminder.payload)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Cannot insert reminder ({id})."))?
        .try_into()
    }

    async fn get(&self, id: ReminderId) -> anyhow::Result<Option<Reminder>> {
        sqlx::query_as::<_, RawPostgresReminder>(r#"SELECT * FROM reminders WHERE id = $1"#)
            .bind(*id)
            .fetch_optional(&self.pool)
            .await?
            .map(Reminder::try_from)
            .transpose()
    }

    async fn claim_due(
        &self,
        now: OffsetDateTime,
        batch_size: usize,
        lease_until: OffsetDateTime,
    ) -> anyhow::Result<Vec<ClaimedReminder>> {
        if batch_size == 0 {
            return Ok(vec![]);
        }

        // Rows locked by a concurrent claimer are skipped instead of waited for.
        let token = Uuid::now_v7();
        let raw_reminders = sqlx::query_as::<_, RawPostgresReminder>(
            r#"
UPDATE reminders
SET claim_token = $1, claimed_until = $2
WHERE id IN (
    SELECT id FROM reminders
    WHERE status = 'pending'
      AND next_attempt_at <= $3
      AND (claimed_until IS NULL OR claimed_until <= $3)
    ORDER BY next_attempt_at, id
    LIMIT $4
    FOR UPDATE SKIP LOCKED
)
RETURNING *
        "#,
        )
        .bind(token)
        .bind(lease_until)
        .bind(now)
        .bind(i64::try_from(batch_size)?)
        .fetch_all(&self.pool)
        .await
        .with_context(|| "Cannot claim due reminders.")?;

        let mut claimed = raw_reminders
            .into_iter()
            .map(|raw_reminder| {
                let reminder = Reminder::try_from(raw_reminder)?;
                let claim = ReminderClaim {
                    id: reminder.id,
                    token,
                };
                Ok(ClaimedReminder { reminder, claim })
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        claimed.sort_by_key(|claimed| (claimed.reminder.next_attempt_at, claimed.reminder.id));

        debug!(token = %token, "Claimed {} due reminders.", claimed.len());
        Ok(claimed)
    }

    async fn mark_dispatched(
        &self,
        claim: &ReminderClaim,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
UPDATE reminders
SET status = 'dispatched', next_attempt_at = NULL, dispatched_at = $3, updated_at = $3,
    claim_token = NULL, claimed_until = NULL
WHERE id = $1 AND claim_token = $2 AND status = 'pending'
        "#,
        )
        .bind(*claim.id)
        .bind(claim.token)
        .bind(now)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Cannot mark reminder ({}) as dispatched.", claim.id))?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_retry(
        &self,
        claim: &ReminderClaim,
        next_attempt_at: OffsetDateTime,
        error: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
UPDATE reminders
SET attempt_count = attempt_count + 1, last_error = $3, next_attempt_at = $4, updated_at = $5,
    claim_token = NULL, claimed_until = NULL
WHERE id = $1 AND claim_token = $2 AND status = 'pending'
        "#,
        )
        .bind(*claim.id)
        .bind(claim.token)
        .bind(truncate_error(error))
        .bind(next_attempt_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Cannot schedule retry for reminder ({}).", claim.id))?;

        Ok(result.rows_affected() == 1)
    }

    async fn mark_failed(
        &self,
        claim: &ReminderClaim,
        error: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
UPDATE reminders
SET status = 'failed', attempt_count = attempt_count + 1, last_error = $3, next_attempt_at = NULL,
    updated_at = $4, claim_token = NULL, claimed_until = NULL
WHERE id = $1 AND claim_token = $2 AND status = 'pending'
        "#,
        )
        .bind(*claim.id)
        .bind(claim.token)
        .bind(truncate_error(error))
        .bind(now)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Cannot mark reminder ({}) as failed.", claim.id))?;

        Ok(result.rows_affected() == 1)
    }

    async fn cancel(&self, id: ReminderId, now: OffsetDateTime) -> anyhow::Result<CancelResult> {
        let cancelled = sqlx::query_as::<_, RawPostgresReminder>(
            r#"
UPDATE reminders
SET status = 'cancelled', next_attempt_at = NULL, updated_at = $2,
    claim_token = NULL, claimed_until = NULL
WHERE id = $1 AND status = 'pending'
RETURNING *
        "#,
        )
        .bind(*id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Cannot cancel reminder ({id})."))?;
        if let Some(raw_reminder) = cancelled {
            return Ok(CancelResult::Cancelled(raw_reminder.try_into()?));
        }

        Ok(match self.get(id).await? {
            None => CancelResult::NotFound,
            Some(reminder) if reminder.status == ReminderStatus::Cancelled => {
                CancelResult::AlreadyCancelled(reminder)
            }
            Some(reminder) if reminder.status.is_terminal() => {
                CancelResult::NotCancellable(reminder.status)
            }
            Some(_) => bail!("Reminder ({id}) is pending but cannot be cancelled."),
        })
    }

    async fn list(
        &self,
        status: Option<ReminderStatus>,
        limit: u32,
    ) -> anyhow::Result<Vec<Reminder>> {
        sqlx::query_as::<_, RawPostgresReminder>(
            r#"
SELECT * FROM reminders
WHERE ($1::TEXT IS NULL OR status = $1)
ORDER BY created_at, id
LIMIT $2
        "#,
        )
        .bind(status.map(|status| status.as_str()))
        .bind(i64::from(clamp_list_limit(limit)))
        .fetch_all(&self.pool)
        .await
        .with_context(|| "Cannot list reminders.")?
        .into_iter()
        .map(Reminder::try_from)
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::PostgresReminderStore;
    use crate::{
        database::{CancelResult, ReminderStore},
        reminders::ReminderStatus,
        tests::mock_new_reminder,
    };
    use serde_json::json;
    use sqlx::PgPool;
    use std::{collections::HashSet, time::Duration};
    use time::macros::datetime;

    #[sqlx::test(migrations = false)]
    #[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
    async fn can_insert_claim_and_dispatch(pool: PgPool) -> anyhow::Result<()> {
        let store = PostgresReminderStore::create(pool).await?;
        let created_at = datetime!(2025-10-17 03:00:00 UTC);

        let mut new_reminder = mock_new_reminder("Standup", datetime!(2025-10-17 04:25:00 UTC));
        new_reminder.payload = Some(json!({ "to": "+15550001" }));
        let reminder = store.insert(new_reminder, created_at).await?;
        assert_eq!(reminder.status, ReminderStatus::Pending);
        assert_eq!(reminder.next_attempt_at, Some(reminder.target_at));
        assert_eq!(reminder.payload, Some(json!({ "to": "+15550001" })));
        assert_eq!(store.get(reminder.id).await?, Some(reminder.clone()));

        let now = datetime!(2025-10-17 04:30:00 UTC);
        let claimed = store
            .claim_due(now, 10, now + Duration::from_secs(120))
            .await?;
        assert_eq!(claimed.len(), 1);
        assert!(
            store
                .claim_due(now, 10, now + Duration::from_secs(120))
                .await?
                .is_empty()
        );

        assert!(store.mark_dispatched(&claimed[0].claim, now).await?);
        assert!(!store.mark_dispatched(&claimed[0].claim, now).await?);

        let dispatched = store.get(reminder.id).await?.unwrap();
        assert_eq!(dispatched.status, ReminderStatus::Dispatched);
        assert_eq!(dispatched.dispatched_at, Some(now));
        assert_eq!(
            store.cancel(reminder.id, now).await?,
            CancelResult::NotCancellable(ReminderStatus::Dispatched)
        );

        Ok(())
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
    async fn concurrent_claims_never_overlap(pool: PgPool) -> anyhow::Result<()> {
        let store = PostgresReminderStore::create(pool).await?;
        for _ in 0..30 {
            store
                .insert(
                    mock_new_reminder("concurrent", datetime!(2025-10-17 04:00:00 UTC)),
                    datetime!(2025-10-17 03:00:00 UTC),
                )
                .await?;
        }

        let now = datetime!(2025-10-17 04:30:00 UTC);
        let lease_until = now + Duration::from_secs(120);
        let (first, second, third) = tokio::join!(
            store.claim_due(now, 12, lease_until),
            store.claim_due(now, 12, lease_until),
            store.claim_due(now, 12, lease_until)
        );

        let claimed = [first?, second?, third?]
            .into_iter()
            .flatten()
            .map(|claimed| claimed.reminder.id)
            .collect::<Vec<_>>();
        assert_eq!(claimed.iter().collect::<HashSet<_>>().len(), claimed.len());

        // Rows skipped because of the concurrent locks are picked up by the next claim.
        let rest = store.claim_due(now, 30, lease_until).await?;
        assert_eq!(claimed.len() + rest.len(), 30);

        Ok(())
    }

    #[sqlx::test(migrations = false)]
    #[ignore = "requires a PostgreSQL server (DATABASE_URL)"]
    async fn can_retry_cancel_and_list(pool: PgPool) -> anyhow::Result<()> {
        let store = PostgresReminderStore::create(pool).await?;
        let created_at = datetime!(2025-10-17 03:00:00 UTC);
        let retried = store
            .insert(mock_new_reminder("retried", datetime!(2025-10-17 04:00:00 UTC)), created_at)
            .await?;
        let cancelled = store
            .insert(mock_new_reminder("cancelled", datetime!(2025-10-17 05:00:00 UTC)), created_at)
            .await?;

        let now = datetime!(2025-10-17 04:00:00 UTC);
        let claimed = store
            .claim_due(now, 10, now + Duration::from_secs(120))
            .await?;
        assert_eq!(claimed.len(), 1);
        assert!(
            store
                .mark_retry(&claimed[0].claim, now + Duration::from_secs(30), "HTTP 503", now)
                .await?
        );
        let reminder = store.get(retried.id).await?.unwrap();
        assert_eq!(reminder.attempt_count, 1);
        assert_eq!(reminder.last_error.as_deref(), Some("HTTP 503"));

        assert!(matches!(
            store.cancel(cancelled.id, now).await?,
            CancelResult::Cancelled(_)
        ));
        assert!(matches!(
            store.cancel(cancelled.id, now).await?,
            CancelResult::AlreadyCancelled(_)
        ));

        let pending = store.list(Some(ReminderStatus::Pending), 20).await?;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, retried.id);
        assert_eq!(store.list(None, 20).await?.len(), 2);

        Ok(())
    }
}
