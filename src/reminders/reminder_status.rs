use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Externally visible lifecycle state of a reminder. Claims are tracked separately and never
/// surface as a distinct status.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    /// Waiting for its target time or for the next retry.
    Pending,
    /// Delivered to the webhook.
    Dispatched,
    /// Delivery failed permanently or retries are exhausted.
    Failed,
    /// Cancelled by a caller before it was dispatched.
    Cancelled,
}

impl ReminderStatus {
    /// Returns the value used to persist the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dispatched => "dispatched",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Indicates whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for ReminderStatus {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "dispatched" => Ok(Self::Dispatched),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(anyhow::anyhow!("Unknown reminder status `{other}`.")),
        }
    }
}

impl Display for ReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
