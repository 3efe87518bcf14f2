use crate::config::{DatabaseConfig, DispatcherConfig, HttpConfig};
use figment::{Figment, Metadata, Profile, Provider, providers, providers::Format, value};
use serde_derive::{Deserialize, Serialize};
use url::Url;

/// Raw configuration structure that is used to read the configuration from the file.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RawConfig {
    /// URL of the webhook that receives due reminders.
    pub webhook_url: Url,
    /// Database configuration.
    pub db: DatabaseConfig,
    /// Configuration for the HTTP functionality.
    pub http: HttpConfig,
    /// Configuration for the reminder dispatcher.
    pub dispatcher: DispatcherConfig,
}

impl RawConfig {
    /// Reads the configuration from the file (TOML) and merges it with the default values.
    pub fn read_from_file(path: &str) -> anyhow::Result<Self> {
        Ok(Figment::from(RawConfig::default())
            .merge(providers::Toml::file(path))
            .merge(providers::Env::prefixed("REMINDHOOK_").split("__"))
            .extract()?)
    }
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            webhook_url: Url::parse("https://example.com/webhooks/reminders")
                .expect("Cannot parse webhook URL parameter."),
            db: DatabaseConfig::default(),
            http: HttpConfig::default(),
            dispatcher: DispatcherConfig::default(),
        }
    }
}

impl Provider for RawConfig {
    fn metadata(&self) -> Metadata {
        Metadata::named("Remindhook main configuration")
    }

    fn data(&self) -> Result<value::Map<Profile, value::Dict>, figment::Error> {
        providers::Serialized::defaults(Self::default()).data()
    }
}
