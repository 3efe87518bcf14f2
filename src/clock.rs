use std::{
    fmt::Debug,
    sync::{Arc, Mutex},
    time::Duration,
};
use time::OffsetDateTime;

/// Source of the current time used by the dispatcher and the public reminder operations.
pub trait Clock: Debug + Send + Sync {
    /// Returns the current instant in UTC.
    fn now(&self) -> OffsetDateTime;
}

/// Clock backed by the system time.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Arc<Mutex<OffsetDateTime>>,
}

impl FixedClock {
    /// Creates a clock frozen at the specified instant.
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Moves the clock to the specified instant.
    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock().unwrap_or_else(|err| err.into_inner()) = now;
    }

    /// Moves the clock forward by the specified duration.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|err| err.into_inner());
        *now += duration;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(|err| err.into_inner())
    }
}
