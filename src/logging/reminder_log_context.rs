use crate::reminders::{ReminderId, ReminderStatus};
use serde::Serialize;

/// Represents a context for the reminder used for the structured logging.
#[derive(Serialize, Debug, Copy, Clone, PartialEq)]
pub struct ReminderLogContext {
    /// Unique id of the reminder.
    pub id: ReminderId,
    /// Status of the reminder at the time of logging.
    pub status: ReminderStatus,
    /// Number of failed delivery attempts so far.
    pub attempt_count: u32,
}

impl ReminderLogContext {
    /// Returns context used for the structured logging.
    pub fn new(id: ReminderId, status: ReminderStatus, attempt_count: u32) -> Self {
        Self {
            id,
            status,
            attempt_count,
        }
    }
}
