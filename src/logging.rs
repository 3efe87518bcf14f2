mod reminder_log_context;

pub use self::reminder_log_context::ReminderLogContext;
