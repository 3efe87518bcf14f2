use crate::{clock::Clock, config::Config, database::ReminderStore};
use std::sync::Arc;

/// Entry point to the public reminder operations. Clones share the same store and clock.
#[derive(Clone)]
pub struct Api {
    pub config: Config,
    pub(crate) store: Arc<dyn ReminderStore>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Api {
    /// Instantiates APIs collection with the specified config, store and clock.
    pub fn new(config: Config, store: Arc<dyn ReminderStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            store,
            clock,
        }
    }
}

impl AsRef<Api> for Api {
    fn as_ref(&self) -> &Self {
        self
    }
}
