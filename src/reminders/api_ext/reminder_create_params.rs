use serde::Deserialize;

/// Parameters of the `schedule` reminder operation.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ReminderCreateParams {
    /// Human readable title of the reminder.
    pub title: String,
    /// Context message of the reminder.
    pub message: String,
    /// Target time with an explicit UTC offset, e.g. `2025-10-17T11:25:00+07:00`.
    pub target_time_iso: String,
    /// Optional JSON document forwarded verbatim to the webhook.
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}
