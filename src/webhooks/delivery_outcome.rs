use reqwest::StatusCode;
use std::fmt::Display;

/// Result of a single webhook delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The webhook accepted the reminder.
    Success,
    /// The attempt failed for a reason that may go away on its own (network, timeout, 5xx, 408, 429).
    RetryableFailure(String),
    /// The webhook rejected the reminder, retrying won't help.
    PermanentFailure(String),
}

impl DeliveryOutcome {
    /// Classifies the HTTP status returned by the webhook.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        if status.is_success() {
            return Self::Success;
        }

        let body = body.trim();
        let message = if body.is_empty() {
            format!("Webhook responded with {status}.")
        } else {
            format!("Webhook responded with {status}: {body}")
        };

        Self::failure(status, message)
    }

    /// Classifies the HTTP status returned by the webhook when its response body can't be read.
    pub fn from_unreadable_body(status: StatusCode, err: impl Display) -> Self {
        if status.is_success() {
            return Self::Success;
        }

        Self::failure(
            status,
            format!("Webhook responded with {status}; body unreadable: {err}"),
        )
    }

    fn failure(status: StatusCode, message: String) -> Self {
        if status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
        {
            Self::RetryableFailure(message)
        } else {
            Self::PermanentFailure(message)
        }
    }
}
