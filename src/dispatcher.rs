mod dispatcher_handle;
mod retry_policy;

use crate::{
    clock::Clock,
    config::DispatcherConfig,
    database::{ClaimedReminder, ReminderStore},
    webhooks::{DeliveryOutcome, WebhookClient},
};
use anyhow::anyhow;
use futures::{StreamExt, stream};
use std::{sync::Arc, time::Duration};
use time::OffsetDateTime;
use tokio::{sync::watch, time::MissedTickBehavior};
use tracing::{debug, error, info, warn};

pub use self::{dispatcher_handle::DispatcherHandle, retry_policy::RetryPolicy};

/// Periodically claims due reminders and delivers them to the webhook.
#[derive(Debug)]
pub struct Dispatcher {
    store: Arc<dyn ReminderStore>,
    webhook_client: WebhookClient,
    clock: Arc<dyn Clock>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Creates a new dispatcher instance.
    pub fn new(
        store: Arc<dyn ReminderStore>,
        webhook_client: WebhookClient,
        clock: Arc<dyn Clock>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            store,
            webhook_client,
            clock,
            config,
        }
    }

    /// Spawns the polling loop. The loop keeps running until the returned handle is shut down or
    /// dropped.
    pub fn start(self) -> DispatcherHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.run(shutdown_rx).await });

        DispatcherHandle::new(shutdown_tx, task)
    }

    /// Claims due reminders once and delivers them with bounded concurrency. Returns the number of
    /// claimed reminders.
    pub async fn tick(&self) -> anyhow::Result<usize> {
        let now = self.clock.now();
        let lease_until = checked_delay(now, self.config.claim_timeout).ok_or_else(|| {
            anyhow!(
                "Claim timeout ({:?}) is out of the supported range.",
                self.config.claim_timeout
            )
        })?;
        let claimed = self
            .store
            .claim_due(now, self.config.batch_size, lease_until)
            .await?;
        let claimed_count = claimed.len();
        if claimed_count == 0 {
            return Ok(0);
        }

        debug!("Delivering {claimed_count} due reminders.");
        stream::iter(claimed)
            .for_each_concurrent(self.config.batch_size, |claimed| self.process(claimed))
            .await;

        Ok(claimed_count)
    }

    async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            poll_interval = ?self.config.poll_interval,
            batch_size = self.config.batch_size,
            webhook_url = %self.webhook_client.url(),
            "Reminder dispatcher started."
        );

        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                // Either an explicit shutdown signal or the dropped handle.
                _ = shutdown_rx.changed() => break,
            }

            // Keep draining while the backlog fills whole batches.
            loop {
                match self.tick().await {
                    Ok(claimed) if claimed >= self.config.batch_size => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    Ok(_) => break,
                    Err(err) => {
                        error!("Failed to claim due reminders: {err:?}");
                        break;
                    }
                }
            }

            if *shutdown_rx.borrow() {
                break;
            }
        }

        info!("Reminder dispatcher stopped.");
    }

    async fn process(&self, claimed: ClaimedReminder) {
        let ClaimedReminder { reminder, claim } = claimed;
        let outcome = self.webhook_client.deliver(&reminder).await;
        let now = self.clock.now();
        let retry = &self.config.retry;

        let write_back = match outcome {
            DeliveryOutcome::Success => {
                info!(reminder = ?reminder.log_context(), "Successfully delivered reminder.");
                self.store.mark_dispatched(&claim, now).await
            }
            DeliveryOutcome::RetryableFailure(err) if !retry.is_exhausted(reminder.attempt_count) => {
                match checked_delay(now, retry.interval(reminder.attempt_count)) {
                    Some(next_attempt_at) => {
                        warn!(
                            reminder = ?reminder.log_context(),
                            "Failed to deliver reminder, will retry at {next_attempt_at}: {err}"
                        );
                        self.store
                            .mark_retry(&claim, next_attempt_at, &err, now)
                            .await
                    }
                    None => {
                        error!(
                            reminder = ?reminder.log_context(),
                            "Failed to deliver reminder, next retry time is out of range: {err}"
                        );
                        self.store.mark_failed(&claim, &err, now).await
                    }
                }
            }
            DeliveryOutcome::RetryableFailure(err) => {
                error!(
                    reminder = ?reminder.log_context(),
                    "Failed to deliver reminder, retries are exhausted: {err}"
                );
                self.store.mark_failed(&claim, &err, now).await
            }
            DeliveryOutcome::PermanentFailure(err) => {
                error!(
                    reminder = ?reminder.log_context(),
                    "Failed to deliver reminder, the webhook rejected it: {err}"
                );
                self.store.mark_failed(&claim, &err, now).await
            }
        };

        match write_back {
            Ok(true) => {}
            Ok(false) => warn!(
                reminder = ?reminder.log_context(),
                "Reminder claim was lost before the delivery outcome was recorded (lease expired or reminder cancelled)."
            ),
            Err(err) => error!(
                reminder = ?reminder.log_context(),
                "Failed to record delivery outcome: {err:?}"
            ),
        }
    }
}

/// Returns the instant `delay` after `now`, or `None` if it isn't representable.
fn checked_delay(now: OffsetDateTime, delay: Duration) -> Option<OffsetDateTime> {
    time::Duration::try_from(delay)
        .ok()
        .and_then(|delay| now.checked_add(delay))
}
