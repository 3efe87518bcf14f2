use crate::{
    config::HttpClientConfig,
    reminders::{Reminder, ReminderId},
    webhooks::DeliveryOutcome,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::debug;
use url::Url;

/// Header that carries the ID of the delivered reminder.
pub const REMINDER_ID_HEADER: &str = "X-Reminder-Id";

/// Header that carries the 1-based number of the delivery attempt.
pub const REMINDER_ATTEMPT_HEADER: &str = "X-Reminder-Attempt";

/// Body sent for reminders that don't have a custom payload.
#[derive(Serialize, Debug, PartialEq)]
struct WebhookEnvelope<'a> {
    reminder_id: ReminderId,
    title: &'a str,
    message: &'a str,
    #[serde(with = "time::serde::rfc3339")]
    target_time_iso: OffsetDateTime,
}

/// HTTP client that delivers due reminders to the configured webhook.
#[derive(Clone, Debug)]
pub struct WebhookClient {
    url: Url,
    http_client: ClientWithMiddleware,
}

impl WebhookClient {
    /// Creates a client that posts to the specified URL with the configured timeouts.
    pub fn new(url: Url, config: &HttpClientConfig) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .build()?;

        Ok(Self {
            url,
            http_client: ClientBuilder::new(http_client)
                .with(TracingMiddleware::default())
                .build(),
        })
    }

    /// Returns the URL reminders are delivered to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Makes a single delivery attempt for the reminder and classifies its outcome.
    pub async fn deliver(&self, reminder: &Reminder) -> DeliveryOutcome {
        let request = self
            .http_client
            .post(self.url.clone())
            .header(REMINDER_ID_HEADER, reminder.id.to_string())
            .header(
                REMINDER_ATTEMPT_HEADER,
                reminder.attempt_count.saturating_add(1).to_string(),
            );
        let request = match reminder.payload {
            Some(ref payload) => request.json(payload),
            None => request.json(&WebhookEnvelope {
                reminder_id: reminder.id,
                title: &reminder.title,
                message: &reminder.message,
                target_time_iso: reminder.target_at,
            }),
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                return DeliveryOutcome::RetryableFailure(format!(
                    "Webhook request failed: {err}"
                ));
            }
        };

        let status = response.status();
        debug!(
            reminder = ?reminder.log_context(),
            "Webhook responded with {status}."
        );
        if status.is_success() {
            return DeliveryOutcome::Success;
        }

        match response.text().await {
            Ok(body) => DeliveryOutcome::from_status(status, &body),
            Err(err) => DeliveryOutcome::from_unreadable_body(status, err),
        }
    }
}
