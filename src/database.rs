mod cancel_result;
mod postgres_store;
mod reminder_claim;
mod sqlite_store;

use crate::{
    config::{DatabaseConfig, DatabaseType},
    reminders::{NewReminder, Reminder, ReminderId, ReminderStatus},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};
use time::OffsetDateTime;

pub use self::{
    cancel_result::CancelResult,
    postgres_store::PostgresReminderStore,
    reminder_claim::{ClaimedReminder, ReminderClaim},
    sqlite_store::SqliteReminderStore,
};

/// Maximum number of characters of the delivery error persisted with the reminder.
pub const MAX_LAST_ERROR_LENGTH: usize = 512;

/// Default number of reminders returned by `list` when the caller doesn't specify a limit.
pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Maximum number of reminders returned by `list` at once.
pub const MAX_LIST_LIMIT: u32 = 1000;

/// Durable storage for reminders. All coordination between concurrent dispatchers and the public
/// operations happens through the atomic conditional updates implemented by the store.
#[async_trait]
pub trait ReminderStore: Debug + Send + Sync {
    /// Persists a new pending reminder that becomes due at its target time.
    async fn insert(&self, reminder: NewReminder, now: OffsetDateTime) -> anyhow::Result<Reminder>;

    /// Retrieves reminder using its ID.
    async fn get(&self, id: ReminderId) -> anyhow::Result<Option<Reminder>>;

    /// Atomically claims up to `batch_size` due reminders until `lease_until`. Returned reminders
    /// are ordered by the time they became eligible.
    async fn claim_due(
        &self,
        now: OffsetDateTime,
        batch_size: usize,
        lease_until: OffsetDateTime,
    ) -> anyhow::Result<Vec<ClaimedReminder>>;

    /// Marks claimed reminder as delivered. Returns `false` if the claim is no longer valid.
    async fn mark_dispatched(
        &self,
        claim: &ReminderClaim,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool>;

    /// Records a failed attempt and makes the reminder eligible again at `next_attempt_at`.
    /// Returns `false` if the claim is no longer valid.
    async fn mark_retry(
        &self,
        claim: &ReminderClaim,
        next_attempt_at: OffsetDateTime,
        error: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool>;

    /// Records a failed attempt and moves the reminder to the terminal `failed` state. Returns
    /// `false` if the claim is no longer valid.
    async fn mark_failed(
        &self,
        claim: &ReminderClaim,
        error: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<bool>;

    /// Cancels pending reminder, including the one that is currently claimed.
    async fn cancel(&self, id: ReminderId, now: OffsetDateTime) -> anyhow::Result<CancelResult>;

    /// Lists reminders ordered by creation time, optionally filtered by status.
    async fn list(
        &self,
        status: Option<ReminderStatus>,
        limit: u32,
    ) -> anyhow::Result<Vec<Reminder>>;
}

/// Entry point to the reminder storage backends.
pub struct Database;

impl Database {
    /// Opens the store for the configured backend and applies pending migrations.
    pub async fn open(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn ReminderStore>> {
        Ok(match config.db_type {
            DatabaseType::Sqlite => Arc::new(SqliteReminderStore::open(config).await?),
            DatabaseType::Postgres => Arc::new(PostgresReminderStore::open(config).await?),
        })
    }
}

/// Truncates delivery error to the length that is persisted with the reminder.
pub(crate) fn truncate_error(error: &str) -> String {
    error.chars().take(MAX_LAST_ERROR_LENGTH).collect()
}

/// Clamps the number of reminders to return to the supported range.
pub(crate) fn clamp_list_limit(limit: u32) -> u32 {
    limit.clamp(1, MAX_LIST_LIMIT)
}
