use crate::reminders::{NewReminder, Reminder};
use anyhow::Context;
use time::OffsetDateTime;
use uuid::Uuid;

/// Converts an instant into the integer unix microseconds stored in SQLite timestamp columns.
pub(super) fn to_unix_micros(instant: OffsetDateTime) -> anyhow::Result<i64> {
    i64::try_from(instant.unix_timestamp_nanos() / 1_000)
        .with_context(|| format!("Timestamp {instant} is out of range."))
}

/// Restores an instant from the integer unix microseconds stored in SQLite timestamp columns.
pub(super) fn from_unix_micros(micros: i64) -> anyhow::Result<OffsetDateTime> {
    Ok(OffsetDateTime::from_unix_timestamp_nanos(
        i128::from(micros) * 1_000,
    )?)
}

/// Reminder row as stored in SQLite: timestamps are unix microseconds and the payload is JSON text.
#[derive(sqlx::FromRow, Debug, Eq, PartialEq, Clone)]
pub(super) struct RawSqliteReminder {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub target_at: i64,
    pub payload: Option<String>,
    pub status: String,
    pub attempt_count: i64,
    pub next_attempt_at: Option<i64>,
    pub last_error: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub dispatched_at: Option<i64>,
    pub claim_token: Option<Uuid>,
    pub claimed_until: Option<i64>,
}

/// Column values of a reminder that is about to be inserted.
pub(super) struct RawSqliteNewReminder {
    pub title: String,
    pub message: String,
    pub target_at: i64,
    pub payload: Option<String>,
}

impl TryFrom<RawSqliteReminder> for Reminder {
    type Error = anyhow::Error;

    fn try_from(raw: RawSqliteReminder) -> Result<Self, Self::Error> {
        Ok(Reminder {
            id: raw.id.into(),
            title: raw.title,
            message: raw.message,
            target_at: from_unix_micros(raw.target_at)?,
            payload: raw
                .payload
                .map(|payload| serde_json::from_str(&payload))
                .transpose()
                .with_context(|| format!("Cannot deserialize payload of reminder ({}).", raw.id))?,
            status: raw.status.parse()?,
            attempt_count: u32::try_from(raw.attempt_count)?,
            next_attempt_at: raw
                .next_attempt_at
                .map(from_unix_micros)
                .transpose()?,
            last_error: raw.last_error,
            created_at: from_unix_micros(raw.created_at)?,
            updated_at: from_unix_micros(raw.updated_at)?,
            dispatched_at: raw
                .dispatched_at
                .map(from_unix_micros)
                .transpose()?,
        })
    }
}

impl TryFrom<&NewReminder> for RawSqliteNewReminder {
    type Error = anyhow::Error;

    fn try_from(reminder: &NewReminder) -> Result<Self, Self::Error> {
        Ok(Self {
            title: reminder.title.clone(),
            message: reminder.message.clone(),
            target_at: to_unix_micros(reminder.target_at)?,
            payload: reminder
                .payload
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?,
        })
    }
}
