use crate::reminders::ReminderStatus;
use serde::Deserialize;

/// Parameters of the `list` reminders operation.
#[derive(Deserialize, Debug, Default, Copy, Clone, PartialEq)]
pub struct ReminderListParams {
    /// Only return reminders in this status.
    pub status: Option<ReminderStatus>,
    /// Maximum number of reminders to return (1..=1000, 20 by default).
    pub limit: Option<u32>,
}
