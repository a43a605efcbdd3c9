//! Handles settings for the application. Configuration is written in
//! `settings.toml`, with `GOFIT_*` environment variables taking precedence.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    /// Log level for the `tracing` env filter.
    pub level: String,
    /// Where the session state file lives.
    pub session_path: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            session_path: "config/session.json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("./gofit.db".to_string())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("GOFIT").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
