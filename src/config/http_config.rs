use serde_derive::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use std::time::Duration;

/// Configuration for the HTTP functionality.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct HttpConfig {
    /// Configuration for the HTTP client used to deliver webhooks.
    #[serde(default)]
    pub client: HttpClientConfig,
}

/// Describes the HTTP client configuration.
#[serde_as]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct HttpClientConfig {
    /// Total request timeout. The timeout is applied from when the request starts connecting until
    /// the response body has finished. Default is 10 seconds.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
    /// Timeout for idle sockets being kept-alive. Default is 5 seconds.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_pool_idle_timeout")]
    pub pool_idle_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            pool_idle_timeout: default_pool_idle_timeout(),
        }
    }
}

/// Defines default timeout for idle sockets being kept-alive.
const fn default_pool_idle_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Default total request timeout.
const fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

#[cfg(test)]
mod tests {
    use super::{HttpClientConfig, HttpConfig};
    use insta::assert_toml_snapshot;
    use std::time::Duration;

    #[test]
    fn serialization_and_default() {
        assert_toml_snapshot!(HttpConfig::default(), @"client = { timeout = 10000, pool_idle_timeout = 5000 }");

        let config = HttpConfig {
            client: HttpClientConfig {
                timeout: Duration::from_secs(60),
                pool_idle_timeout: Duration::from_secs(10),
            },
        };

        assert_toml_snapshot!(config, @"client = { timeout = 60000, pool_idle_timeout = 10000 }");
    }

    #[test]
    fn deserialization() {
        let config: HttpConfig = toml::from_str(
            r#"
        [client]
        timeout = 10000
        pool_idle_timeout = 5000
    "#,
        )
        .unwrap();
        assert_eq!(config, HttpConfig::default());

        let config: HttpConfig = toml::from_str(
            r#"
        [client]
        timeout = 2500
    "#,
        )
        .unwrap();
        assert_eq!(
            config,
            HttpConfig {
                client: HttpClientConfig {
                    timeout: Duration::from_millis(2500),
                    pool_idle_timeout: Duration::from_secs(5),
                },
            }
        );
    }
}
