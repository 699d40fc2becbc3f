//! Handles settings for the application.
//!
//! Values come from `settings.toml` (or the file named by
//! `PEERPAY_SETTINGS`) and are overridden by `PEERPAY_` environment
//! variables, with `__` between nested keys: `PEERPAY_SERVER__PORT=8080`.
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const DEFAULT_SETTINGS_FILE: &str = "settings";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub database: Database,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            database: Database::Memory,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    pub identity_ms: u64,
    pub store_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        let defaults = engine::Timeouts::default();
        Self {
            identity_ms: defaults.identity.as_millis() as u64,
            store_ms: defaults.store.as_millis() as u64,
        }
    }
}

impl From<&Timeouts> for engine::Timeouts {
    fn from(value: &Timeouts) -> Self {
        Self {
            identity: Duration::from_millis(value.identity_ms),
            store: Duration::from_millis(value.store_ms),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Ledger {
    pub enforce_balance: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub timeouts: Timeouts,
    pub ledger: Ledger,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let file = std::env::var("PEERPAY_SETTINGS")
            .unwrap_or_else(|_| DEFAULT_SETTINGS_FILE.to_string());
        Self::from_sources(File::with_name(&file).required(false), "PEERPAY")
    }

    fn from_sources(
        file: impl config::Source + Send + Sync + 'static,
        env_prefix: &str,
    ) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let settings = Settings::from_sources(
            File::with_name("does-not-exist").required(false),
            "PEERPAY_TEST_UNSET",
        )
        .unwrap();
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.database, Database::Memory);
        assert_eq!(settings.timeouts.identity_ms, 5000);
        assert!(!settings.ledger.enforce_balance);
    }

    #[test]
    fn sqlite_database_builds_a_file_url() {
        assert_eq!(
            Database::Sqlite("./peerpay.db".to_string()).url(),
            "sqlite:./peerpay.db?mode=rwc"
        );
        assert_eq!(Database::Memory.url(), "sqlite::memory:");
    }
}
