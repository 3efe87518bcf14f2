use crate::{
    logging::ReminderLogContext,
    reminders::{ReminderId, ReminderStatus},
};
use time::OffsetDateTime;

/// Defines a reminder tracked by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    /// Unique id of the reminder.
    pub id: ReminderId,
    /// Human readable title of the reminder.
    pub title: String,
    /// Context message of the reminder.
    pub message: String,
    /// The instant at which the reminder should fire, in UTC.
    pub target_at: OffsetDateTime,
    /// Arbitrary JSON document forwarded verbatim to the webhook.
    pub payload: Option<serde_json::Value>,
    /// Current lifecycle state.
    pub status: ReminderStatus,
    /// Number of failed delivery attempts.
    pub attempt_count: u32,
    /// The instant at which the next delivery attempt becomes eligible.
    pub next_attempt_at: Option<OffsetDateTime>,
    /// Description of the most recent delivery failure.
    pub last_error: Option<String>,
    /// The instant at which the reminder was created.
    pub created_at: OffsetDateTime,
    /// The instant at which the reminder was last modified.
    pub updated_at: OffsetDateTime,
    /// The instant at which the reminder was delivered.
    pub dispatched_at: Option<OffsetDateTime>,
}

impl Reminder {
    /// Returns context used for the structured logging.
    pub fn log_context(&self) -> ReminderLogContext {
        ReminderLogContext::new(self.id, self.status, self.attempt_count)
    }
}
