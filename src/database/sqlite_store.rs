mod raw_sqlite_reminder;

use self::raw_sqlite_reminder::{RawSqliteNewReminder, RawSqliteReminder, to_unix_micros};
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
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::{fs, time::Duration};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

/// How long a connection waits for the database-level write lock held by another connection.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Reminder store backed by an embedded single-file SQLite database.
#[derive(Clone, Debug)]
pub struct SqliteReminderStore {
    pool: SqlitePool,
}

impl SqliteReminderStore {
    /// Opens (and creates, if needed) the database file specified in the config.
    pub async fn open(config: &DatabaseConfig) -> anyhow::Result<Self> {
        if let Some(parent) = config
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Cannot create database folder {}.", parent.display())
            })?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await
            .with_context(|| format!("Cannot open database {}.", config.path.display()))?;

        Self::create(pool).await
    }

    /// Creates the store on top of an existing pool and applies pending migrations.
    pub async fn create(pool: SqlitePool) -> anyhow::Result<Self> {
        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .with_context(|| "Failed to migrate database")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl ReminderStore for SqliteReminderStore {
    async fn insert(&self, reminder: NewReminder, now: OffsetDateTime) -> anyhow::Result<Reminder> {
        let raw_reminder = RawSqliteNewReminder::try_from(&reminder)?;
        let id = ReminderId::new();
        let now = to_unix_micros(now)?;

        sqlx::query_as::<_, RawSqliteReminder>(
            r#"
INSERT INTO reminders (id, title, message, target_at, payload, status, attempt_count, next_attempt_at, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5, 'pending', 0, ?4, ?6, ?6)
RETURNING *
        "#,
        )
        .bind(*id)
        .bind(raw_reminder.title)
        .bind(raw_reminder.message)
        .bind(raw_reminder.target_at)
        .bind(raw_reminder.payload)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Cannot insert reminder ({id})."))?
        .try_into()
    }

    async fn get(&self, id: ReminderId) -> anyhow::Result<Option<Reminder>> {
        sqlx::query_as::<_, RawSqliteReminder>(r#"SELECT * FROM reminders WHERE id = ?1"#)
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

        // A single write statement holds the database-level write lock for its whole duration, so
        // concurrent claimers (even from other processes) can never select the same row.
        let token = Uuid::now_v7();
        let now = to_unix_micros(now)?;
        let raw_reminders = sqlx::query_as::<_, RawSqliteReminder>(
            r#"
UPDATE reminders
SET claim_token = ?1, claimed_until = ?2
WHERE id IN (
    SELECT id FROM reminders
    WHERE status = 'pending'
      AND next_attempt_at <= ?3
      AND (claimed_until IS NULL OR claimed_until <= ?3)
    ORDER BY next_attempt_at, id
    LIMIT ?4
)
RETURNING *
        "#,
        )
        .bind(token)
        .bind(to_unix_micros(lease_until)?)
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
SET status = 'dispatched', next_attempt_at = NULL, dispatched_at = ?3, updated_at = ?3,
    claim_token = NULL, claimed_until = NULL
WHERE id = ?1 AND claim_token = ?2 AND status = 'pending'
        "#,
        )
        .bind(*claim.id)
        .bind(claim.token)
        .bind(to_unix_micros(now)?)
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
SET attempt_count = attempt_count + 1, last_error = ?3, next_attempt_at = ?4, updated_at = ?5,
    claim_token = NULL, claimed_until = NULL
WHERE id = ?1 AND claim_token = ?2 AND status = 'pending'
        "#,
        )
        .bind(*claim.id)
        .bind(claim.token)
        .bind(truncate_error(error))
        .bind(to_unix_micros(next_attempt_at)?)
        .bind(to_unix_micros(now)?)
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
SET status = 'failed', attempt_count = attempt_count + 1, last_error = ?3, next_attempt_at = NULL,
    updated_at = ?4, claim_token = NULL, claimed_until = NULL
WHERE id = ?1 AND claim_token = ?2 AND status = 'pending'
        "#,
        )
        .bind(*claim.id)
        .bind(claim.token)
        .bind(truncate_error(error))
        .bind(to_unix_micros(now)?)
        .execute(&self.pool)
        .await
        .with_context(|| format!("Cannot mark reminder ({}) as failed.", claim.id))?;

        Ok(result.rows_affected() == 1)
    }

    async fn cancel(&self, id: ReminderId, now: OffsetDateTime) -> anyhow::Result<CancelResult> {
        let cancelled = sqlx::query_as::<_, RawSqliteReminder>(
            r#"
UPDATE reminders
SET status = 'cancelled', next_attempt_at = NULL, updated_at = ?2,
    claim_token = NULL, claimed_until = NULL
WHERE id = ?1 AND status = 'pending'
RETURNING *
        "#,
        )
        .bind(*id)
        .bind(to_unix_micros(now)?)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Cannot cancel reminder ({id})."))?;
        if let Some(raw_reminder) = cancelled {
            return Ok(CancelResult::Cancelled(raw_reminder.try_into()?));
        }

        // Terminal states are never left, so the status read here is final.
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
        sqlx::query_as::<_, RawSqliteReminder>(
            r#"
SELECT * FROM reminders
WHERE (?1 IS NULL OR status = ?1)
ORDER BY created_at, id
LIMIT ?2
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
