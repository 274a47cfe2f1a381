//! Configuration for the operation guard
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. `config.{yaml,toml,json}` in the working directory, or the file passed with `--config`
//! 3. `FHIR_GUARD__*` environment variables (`.env` is loaded first), e.g.
//!    `FHIR_GUARD__GUARD__OPERATION_TIMEOUT_SECONDS=120`

use serde::Deserialize;
use std::path::Path;

use crate::{Error, Result};

const ENV_PREFIX: &str = "FHIR_GUARD";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub guard: GuardSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// MongoDB connection string for the administrative connection
    pub url: String,
    /// Database the `currentOp`/`killOp` commands run against
    pub admin_database: String,
    /// Application name reported to the server; shows up in `currentOp` output
    pub app_name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017".to_string(),
            admin_database: "admin".to_string(),
            app_name: "fhir-op-guard".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardSettings {
    pub enabled: bool,
    /// Only operations whose namespace ends with this suffix are touched
    pub namespace_suffix: String,
    /// Operations running at least this long are terminated
    pub operation_timeout_seconds: u64,
    pub poll_interval_seconds: u64,
    /// Upper bound on each `currentOp`/`killOp` round-trip
    pub command_timeout_seconds: u64,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace_suffix: "fhir".to_string(),
            operation_timeout_seconds: 60,
            poll_interval_seconds: 5,
            command_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub file_enabled: bool,
    pub file_directory: String,
    pub file_prefix: String,
    /// daily, hourly, minutely or never
    pub file_rotation: String,
    pub opentelemetry_enabled: bool,
    pub otlp_endpoint: String,
    pub otlp_timeout_seconds: u64,
    pub trace_sample_ratio: f64,
    pub service_name: String,
    pub service_version: Option<String>,
    pub deployment_environment: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file_enabled: false,
            file_directory: "./logs".to_string(),
            file_prefix: "fhir-op-guard".to_string(),
            file_rotation: "daily".to_string(),
            opentelemetry_enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            otlp_timeout_seconds: 10,
            trace_sample_ratio: 1.0,
            service_name: "fhir-op-guard".to_string(),
            service_version: None,
            deployment_environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration, reading `path` instead of the default file when given
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        // A missing .env is fine.
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("config").required(false),
        };

        config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.database.url.trim().is_empty() {
            return Err("database.url must not be empty".to_string());
        }
        if self.database.admin_database.trim().is_empty() {
            return Err("database.admin_database must not be empty".to_string());
        }
        if self.guard.namespace_suffix.is_empty() {
            // An empty suffix matches every namespace, including admin and local.
            return Err("guard.namespace_suffix must not be empty".to_string());
        }
        if self.guard.poll_interval_seconds == 0 {
            return Err("guard.poll_interval_seconds must be greater than 0".to_string());
        }
        if self.guard.command_timeout_seconds == 0 {
            return Err("guard.command_timeout_seconds must be greater than 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.logging.trace_sample_ratio) {
            return Err("logging.trace_sample_ratio must be between 0.0 and 1.0".to_string());
        }
        Ok(())
    }
}
