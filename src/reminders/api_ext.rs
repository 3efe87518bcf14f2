mod reminder_create_params;
mod reminder_list_params;

pub use self::{
    reminder_create_params::ReminderCreateParams, reminder_list_params::ReminderListParams,
};

use crate::{
    api::Api,
    database::{CancelResult, DEFAULT_LIST_LIMIT},
    error::{Error as RemindhookError, ErrorKind},
    reminders::{NewReminder, ReminderId, ReminderSummary, ensure_lead_time, parse_target_time},
};
use anyhow::Context;
use tracing::info;

/// Describes the API to work with reminders.
pub struct RemindersApi<'a> {
    api: &'a Api,
}

impl<'a> RemindersApi<'a> {
    /// Creates Reminders API.
    pub fn new(api: &'a Api) -> Self {
        Self { api }
    }

    /// Validates and persists a new reminder that fires at the specified time.
    pub async fn schedule(
        &self,
        params: ReminderCreateParams,
    ) -> Result<ReminderSummary, RemindhookError> {
        let title = params.title.trim();
        if title.is_empty() {
            return Err(RemindhookError::invalid_request(
                "Reminder title must not be empty.",
            ));
        }

        let message = params.message.trim();
        if message.is_empty() {
            return Err(RemindhookError::invalid_request(
                "Reminder message must not be empty.",
            ));
        }

        let target_at = parse_target_time(&params.target_time_iso)?;
        let now = self.api.clock.now();
        ensure_lead_time(target_at, now, self.api.config.dispatcher.min_lead_time)?;

        let reminder = self
            .api
            .store
            .insert(
                NewReminder {
                    title: title.to_string(),
                    message: message.to_string(),
                    target_at,
                    payload: params.payload.filter(|payload| !payload.is_null()),
                },
                now,
            )
            .await
            .with_context(|| "Cannot schedule reminder.")
            .map_err(RemindhookError::storage)?;

        info!(reminder = ?reminder.log_context(), "Scheduled reminder for {target_at}.");
        Ok(reminder.into())
    }

    /// Lists reminders ordered by creation time.
    pub async fn list(
        &self,
        params: ReminderListParams,
    ) -> Result<Vec<ReminderSummary>, RemindhookError> {
        Ok(self
            .api
            .store
            .list(params.status, params.limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .await
            .with_context(|| "Cannot list reminders.")
            .map_err(RemindhookError::storage)?
            .into_iter()
            .map(ReminderSummary::from)
            .collect())
    }

    /// Cancels pending reminder. Cancelling already cancelled reminder is a no-op.
    pub async fn cancel(&self, reminder_id: &str) -> Result<ReminderSummary, RemindhookError> {
        let not_found = || {
            RemindhookError::new(
                ErrorKind::NotFound,
                format!("Reminder ({}) is not found.", reminder_id.trim()),
            )
        };

        let Ok(id) = reminder_id.parse::<ReminderId>() else {
            return Err(not_found());
        };

        match self
            .api
            .store
            .cancel(id, self.api.clock.now())
            .await
            .with_context(|| format!("Cannot cancel reminder ({id})."))
            .map_err(RemindhookError::storage)?
        {
            CancelResult::Cancelled(reminder) => {
                info!(reminder = ?reminder.log_context(), "Cancelled reminder.");
                Ok(reminder.into())
            }
            CancelResult::AlreadyCancelled(reminder) => Ok(reminder.into()),
            CancelResult::NotCancellable(status) => Err(RemindhookError::new(
                ErrorKind::InvalidState,
                format!("Reminder ({id}) is already {status} and cannot be cancelled."),
            )),
            CancelResult::NotFound => Err(not_found()),
        }
    }
}

impl Api {
    /// Returns an API to work with reminders.
    pub fn reminders(&self) -> RemindersApi<'_> {
        RemindersApi::new(self)
    }
}
