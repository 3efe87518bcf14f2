use crate::reminders::{Reminder, ReminderStatus};

/// Result of the reminder cancellation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CancelResult {
    /// Pending reminder has been cancelled.
    Cancelled(Reminder),
    /// Reminder had already been cancelled before.
    AlreadyCancelled(Reminder),
    /// Reminder reached a terminal state that cannot be cancelled.
    NotCancellable(ReminderStatus),
    /// Reminder doesn't exist.
    NotFound,
}
