use time::OffsetDateTime;

/// Validated reminder content ready to be inserted into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReminder {
    pub title: String,
    pub message: String,
    pub target_at: OffsetDateTime,
    pub payload: Option<serde_json::Value>,
}
