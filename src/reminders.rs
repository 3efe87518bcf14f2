mod api_ext;
mod new_reminder;
mod reminder;
mod reminder_id;
mod reminder_status;
mod reminder_summary;
mod target_time;

pub use self::{
    api_ext::{ReminderCreateParams, ReminderListParams, RemindersApi},
    new_reminder::NewReminder,
    reminder::Reminder,
    reminder_id::ReminderId,
    reminder_status::ReminderStatus,
    reminder_summary::ReminderSummary,
    target_time::{ensure_lead_time, parse_target_time},
};
