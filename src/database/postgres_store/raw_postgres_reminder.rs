use crate::reminders::Reminder;
use time::OffsetDateTime;
use uuid::Uuid;

/// Reminder row as stored in PostgreSQL.
#[derive(sqlx::FromRow, Debug, PartialEq, Clone)]
pub(super) struct RawPostgresReminder {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub target_at: OffsetDateTime,
    pub payload: Option<serde_json::Value>,
    pub status: String,
    pub attempt_count: i32,
    pub next_attempt_at: Option<OffsetDateTime>,
    pub last_error: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub dispatched_at: Option<OffsetDateTime>,
    pub claim_token: Option<Uuid>,
    pub claimed_until: Option<OffsetDateTime>,
}

impl TryFrom<RawPostgresReminder> for Reminder {
    type Error = anyhow::Error;

    fn try_from(raw: RawPostgresReminder) -> Result<Self, Self::Error> {
        Ok(Reminder {
            id: raw.id.into(),
            title: raw.title,
            message: raw.message,
            target_at: raw.target_at,
            payload: raw.payload,
            status: raw.status.parse()?,
            attempt_count: u32::try_from(raw.attempt_count)?,
            next_attempt_at: raw.next_attempt_at,
            last_error: raw.last_error,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
            dispatched_at: raw.dispatched_at,
        })
    }
}
