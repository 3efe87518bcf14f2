pub mod api;
pub mod clock;
pub mod config;
pub mod database;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod reminders;
pub mod webhooks;

pub use crate::{
    api::Api,
    clock::{Clock, FixedClock, SystemClock},
    config::{Config, RawConfig},
    database::{Database, ReminderStore},
    dispatcher::{Dispatcher, DispatcherHandle},
    error::{Error, ErrorKind},
    webhooks::WebhookClient,
};
