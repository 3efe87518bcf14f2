use crate::dispatcher::RetryPolicy;
use serde_derive::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use std::time::Duration;

/// Configuration for the reminder dispatcher.
#[serde_as]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DispatcherConfig {
    /// How often the dispatcher looks for due reminders.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub poll_interval: Duration,
    /// Maximum number of reminders claimed and delivered concurrently per tick.
    pub batch_size: usize,
    /// How long a claim stays valid before another dispatcher can take the reminder over.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub claim_timeout: Duration,
    /// Minimum gap between the scheduling time and the target time of a reminder.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub min_lead_time: Duration,
    /// Backoff applied to retryable delivery failures.
    pub retry: RetryPolicy,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            batch_size: 10,
            claim_timeout: Duration::from_secs(120),
            min_lead_time: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{config::DispatcherConfig, dispatcher::RetryPolicy};
    use insta::assert_debug_snapshot;
    use std::time::Duration;

    #[test]
    fn default() {
        assert_debug_snapshot!(DispatcherConfig::default(), @r###"
        DispatcherConfig {
            poll_interval: 30s,
            batch_size: 10,
            claim_timeout: 120s,
            min_lead_time: 5s,
            retry: RetryPolicy {
                initial_interval: 30s,
                max_interval: 600s,
                max_attempts: 5,
            },
        }
        "###);
    }

    #[test]
    fn deserialization() {
        let config: DispatcherConfig = toml::from_str(
            r#"
        poll_interval = 1000
        batch_size = 50

        [retry]
        initial_interval = 500
        max_attempts = 3
    "#,
        )
        .unwrap();
        assert_eq!(
            config,
            DispatcherConfig {
                poll_interval: Duration::from_secs(1),
                batch_size: 50,
                claim_timeout: Duration::from_secs(120),
                min_lead_time: Duration::from_secs(5),
                retry: RetryPolicy {
                    initial_interval: Duration::from_millis(500),
                    max_interval: Duration::from_secs(600),
                    max_attempts: 3,
                },
            }
        );
    }
}
