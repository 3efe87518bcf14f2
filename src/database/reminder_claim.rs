use crate::reminders::{Reminder, ReminderId};
use uuid::Uuid;

/// Proof of the exclusive, time-bounded ownership of a due reminder.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ReminderClaim {
    /// ID of the claimed reminder.
    pub id: ReminderId,
    /// Token stamped on the reminder row when it was claimed.
    pub token: Uuid,
}

/// Reminder claimed for delivery together with its claim.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimedReminder {
    pub reminder: Reminder,
    pub claim: ReminderClaim,
}
