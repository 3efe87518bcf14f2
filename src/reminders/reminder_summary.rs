use crate::reminders::{Reminder, ReminderId, ReminderStatus};
use serde::Serialize;
use time::OffsetDateTime;

/// Reminder representation returned to the callers of the public operations.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ReminderSummary {
    pub reminder_id: ReminderId,
    pub title: String,
    pub message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub target_time_iso: OffsetDateTime,
    pub payload: Option<serde_json::Value>,
    pub status: ReminderStatus,
    pub attempt_count: u32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub next_attempt_at: Option<OffsetDateTime>,
    pub last_error: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub dispatched_at: Option<OffsetDateTime>,
}

impl From<Reminder> for ReminderSummary {
    fn from(reminder: Reminder) -> Self {
        Self {
            reminder_id: reminder.id,
            title: reminder.title,
            message: reminder.message,
            target_time_iso: reminder.target_at,
            payload: reminder.payload,
            status: reminder.status,
            attempt_count: reminder.attempt_count,
            next_attempt_at: reminder.next_attempt_at,
            last_error: reminder.last_error,
            created_at: reminder.created_at,
            updated_at: reminder.updated_at,
            dispatched_at: reminder.dispatched_at,
        }
    }
}
