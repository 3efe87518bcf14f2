mod database_config;
mod dispatcher_config;
mod http_config;
mod raw_config;

use anyhow::bail;
use std::time::Duration;
use url::Url;

pub use self::{
    database_config::{DatabaseConfig, DatabaseType},
    dispatcher_config::DispatcherConfig,
    http_config::{HttpClientConfig, HttpConfig},
    raw_config::RawConfig,
};

/// Upper bound for the claim lease and the retry interval (30 days).
const MAX_DISPATCHER_DELAY: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Main application config.
#[derive(Clone, Debug)]
pub struct Config {
    /// Version of the Remindhook binary.
    pub version: String,
    /// URL of the webhook that receives due reminders.
    pub webhook_url: Url,
    /// Database configuration.
    pub db: DatabaseConfig,
    /// Configuration for the HTTP functionality.
    pub http: HttpConfig,
    /// Configuration for the reminder dispatcher.
    pub dispatcher: DispatcherConfig,
}

impl AsRef<Config> for Config {
    fn as_ref(&self) -> &Config {
        self
    }
}

impl TryFrom<RawConfig> for Config {
    type Error = anyhow::Error;

    fn try_from(raw_config: RawConfig) -> Result<Self, Self::Error> {
        if !matches!(raw_config.webhook_url.scheme(), "http" | "https") {
            bail!(
                "Webhook URL must use `http` or `https` scheme, got `{}`.",
                raw_config.webhook_url
            );
        }

        let dispatcher = &raw_config.dispatcher;
        if dispatcher.batch_size == 0 {
            bail!("Dispatcher batch size must be greater than zero.");
        }

        if dispatcher.poll_interval.is_zero() {
            bail!("Dispatcher poll interval must be greater than zero.");
        }

        if dispatcher.claim_timeout <= raw_config.http.client.timeout {
            bail!(
                "Dispatcher claim timeout ({:?}) must be longer than the HTTP client timeout ({:?}).",
                dispatcher.claim_timeout,
                raw_config.http.client.timeout
            );
        }

        if dispatcher.claim_timeout > MAX_DISPATCHER_DELAY {
            bail!(
                "Dispatcher claim timeout ({:?}) must not exceed {:?}.",
                dispatcher.claim_timeout,
                MAX_DISPATCHER_DELAY
            );
        }

        let retry = &dispatcher.retry;
        if retry.max_attempts == 0 {
            bail!("Dispatcher retry policy must allow at least one attempt.");
        }

        if retry.initial_interval.is_zero() {
            bail!("Dispatcher retry initial interval must be greater than zero.");
        }

        if retry.max_interval < retry.initial_interval {
            bail!(
                "Dispatcher retry max interval ({:?}) must not be shorter than the initial interval ({:?}).",
                retry.max_interval,
                retry.initial_interval
            );
        }

        if retry.max_interval > MAX_DISPATCHER_DELAY {
            bail!(
                "Dispatcher retry max interval ({:?}) must not exceed {:?}.",
                retry.max_interval,
                MAX_DISPATCHER_DELAY
            );
        }

        Ok(Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            webhook_url: raw_config.webhook_url,
            db: raw_config.db,
            http: raw_config.http,
            dispatcher: raw_config.dispatcher,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{Config, RawConfig};
    use insta::assert_snapshot;
    use std::time::Duration;
    use url::Url;

    #[test]
    fn accepts_default_config() -> anyhow::Result<()> {
        let config = Config::try_from(RawConfig::default())?;
        assert_eq!(config.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            config.webhook_url.as_str(),
            "https://example.com/webhooks/reminders"
        );
        assert_eq!(config.dispatcher.batch_size, 10);

        Ok(())
    }

    #[test]
    fn rejects_invalid_config() -> anyhow::Result<()> {
        let mut raw_config = RawConfig::default();
        raw_config.dispatcher.batch_size = 0;
        assert_snapshot!(Config::try_from(raw_config).unwrap_err(), @"Dispatcher batch size must be greater than zero.");

        let mut raw_config = RawConfig::default();
        raw_config.dispatcher.poll_interval = Duration::ZERO;
        assert_snapshot!(Config::try_from(raw_config).unwrap_err(), @"Dispatcher poll interval must be greater than zero.");

        let mut raw_config = RawConfig::default();
        raw_config.dispatcher.claim_timeout = Duration::from_secs(10);
        assert_snapshot!(Config::try_from(raw_config).unwrap_err(), @"Dispatcher claim timeout (10s) must be longer than the HTTP client timeout (10s).");

        let mut raw_config = RawConfig::default();
        raw_config.dispatcher.claim_timeout = Duration::from_secs(2592001);
        assert_snapshot!(Config::try_from(raw_config).unwrap_err(), @"Dispatcher claim timeout (2592001s) must not exceed 2592000s.");

        let mut raw_config = RawConfig::default();
        raw_config.dispatcher.retry.max_attempts = 0;
        assert_snapshot!(Config::try_from(raw_config).unwrap_err(), @"Dispatcher retry policy must allow at least one attempt.");

        let mut raw_config = RawConfig::default();
        raw_config.dispatcher.retry.initial_interval = Duration::ZERO;
        assert_snapshot!(Config::try_from(raw_config).unwrap_err(), @"Dispatcher retry initial interval must be greater than zero.");

        let mut raw_config = RawConfig::default();
        raw_config.dispatcher.retry.max_interval = Duration::from_secs(1);
        assert_snapshot!(Config::try_from(raw_config).unwrap_err(), @"Dispatcher retry max interval (1s) must not be shorter than the initial interval (30s).");

        let mut raw_config = RawConfig::default();
        raw_config.dispatcher.retry.max_interval = Duration::from_millis(u64::MAX);
        assert_snapshot!(Config::try_from(raw_config).unwrap_err(), @"Dispatcher retry max interval (18446744073709551.615s) must not exceed 2592000s.");

        let mut raw_config = RawConfig::default();
        raw_config.webhook_url = Url::parse("ftp://example.com/reminders")?;
        assert_snapshot!(Config::try_from(raw_config).unwrap_err(), @"Webhook URL must use `http` or `https` scheme, got `ftp://example.com/reminders`.");

        Ok(())
    }
}
