use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use std::time::Duration;

/// Exponential backoff applied to retryable delivery failures (30s -> 60s -> 120s -> ...).
#[serde_as]
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[serde(default)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub initial_interval: Duration,
    /// Upper bound for the delay between retries.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub max_interval: Duration,
    /// Total number of delivery attempts, including the first one.
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Calculates the delay before the next attempt after `attempt_count` failed attempts.
    pub fn interval(&self, attempt_count: u32) -> Duration {
        2u32.checked_pow(attempt_count)
            .and_then(|multiplier| self.initial_interval.checked_mul(multiplier))
            .map(|interval| interval.min(self.max_interval))
            .unwrap_or(self.max_interval)
    }

    /// Indicates whether the failure that follows `attempt_count` previously failed attempts
    /// exhausts the retries.
    pub fn is_exhausted(&self, attempt_count: u32) -> bool {
        attempt_count.saturating_add(1) >= self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(30),
            max_interval: Duration::from_secs(600),
            max_attempts: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RetryPolicy;
    use insta::assert_toml_snapshot;
    use std::time::Duration;

    #[test]
    fn properly_calculates_interval() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.interval(0), Duration::from_secs(30));
        assert_eq!(policy.interval(1), Duration::from_secs(60));
        assert_eq!(policy.interval(2), Duration::from_secs(120));
        assert_eq!(policy.interval(3), Duration::from_secs(240));
        assert_eq!(policy.interval(4), Duration::from_secs(480));
        assert_eq!(policy.interval(5), Duration::from_secs(600));
        assert_eq!(policy.interval(10), Duration::from_secs(600));
    }

    #[test]
    fn saturates_at_max_interval_on_overflow() {
        let policy = RetryPolicy {
            initial_interval: Duration::from_secs(u64::MAX / 2),
            max_interval: Duration::from_secs(3600),
            max_attempts: 100,
        };
        assert_eq!(policy.interval(1), Duration::from_secs(3600));
        assert_eq!(policy.interval(31), Duration::from_secs(3600));
        assert_eq!(policy.interval(32), Duration::from_secs(3600));
        assert_eq!(policy.interval(u32::MAX), Duration::from_secs(3600));
    }

    #[test]
    fn properly_detects_exhausted_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            ..Default::default()
        };
        assert!(!policy.is_exhausted(0));
        assert!(!policy.is_exhausted(1));
        assert!(policy.is_exhausted(2));
        assert!(policy.is_exhausted(3));

        let policy = RetryPolicy {
            max_attempts: 1,
            ..Default::default()
        };
        assert!(policy.is_exhausted(0));
    }

    #[test]
    fn serialization() -> anyhow::Result<()> {
        assert_toml_snapshot!(RetryPolicy::default(), @r###"
        initial_interval = 30000
        max_interval = 600000
        max_attempts = 5
        "###);

        let policy: RetryPolicy = toml::from_str("max_attempts = 8")?;
        assert_eq!(
            policy,
            RetryPolicy {
                initial_interval: Duration::from_secs(30),
                max_interval: Duration::from_secs(600),
                max_attempts: 8,
            }
        );

        Ok(())
    }
}
