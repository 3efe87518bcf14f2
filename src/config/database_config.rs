use serde_derive::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};
use std::{
    fmt::{self, Debug, Formatter},
    path::PathBuf,
    time::Duration,
};

/// Defines the storage backend used to persist reminders.
#[derive(Deserialize, Serialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// Embedded single-file database.
    Sqlite,
    /// PostgreSQL server.
    Postgres,
}

/// Configuration for the database connection.
#[serde_as]
#[derive(Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Type of the database backend.
    #[serde(rename = "type")]
    pub db_type: DatabaseType,
    /// Path to the database file, only used by the `sqlite` backend.
    pub path: PathBuf,
    /// Name of the database to connect to.
    pub name: String,
    /// Hostname to use to connect to the database.
    pub host: String,
    /// Port to use to connect to the database.
    pub port: u16,
    /// Username to use to connect to the database.
    pub username: String,
    /// Optional password to use to connect to the database.
    pub password: Option<String>,
    /// Maximum amount of time to wait for a connection from the pool.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub acquire_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::Sqlite,
            path: PathBuf::from("data/reminders.db"),
            name: "remindhook".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            username: "postgres".to_string(),
            password: None,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl Debug for DatabaseConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("db_type", &self.db_type)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}
