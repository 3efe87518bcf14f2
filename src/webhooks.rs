mod delivery_outcome;
mod webhook_client;

pub use self::{
    delivery_outcome::DeliveryOutcome,
    webhook_client::{REMINDER_ATTEMPT_HEADER, REMINDER_ID_HEADER, WebhookClient},
};
