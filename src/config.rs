//! Terminal configuration.
//!
//! Built once at process start (see [`crate::interfaces::cli`]) and handed to the
//! components that need it. Nothing reads the environment after that point.

use std::time::Duration;

/// Connection settings for the accounting API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL without trailing slash, e.g. `https://kasse.example.org/api`.
    pub base_url: String,
    /// Sent verbatim in the `X-API-Key` header.
    pub api_key: String,
    /// Path of the transaction endpoint relative to `base_url`.
    pub transaction_path: String,
    /// Hard timeout applied to every request.
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api: ApiConfig,
    /// Name submitted with each transaction to identify this terminal.
    pub terminal_name: String,
    /// Debounce window between two accepted dispatches.
    pub token_delay: Duration,
    /// Pause between read cycles.
    pub poll_interval: Duration,
    pub disable_buzzer: bool,
    /// Substrings matched against reader names, first match wins.
    pub reader_families: Vec<String>,
    /// External program used for audible feedback, if any.
    pub feedback_command: Option<String>,
    /// Upper bound on one feedback player run.
    pub feedback_timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            transaction_path: "nfc-transaktion".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Joins `path` onto the base URL with exactly one separating slash.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Returns the trimmed value, treating blank strings as missing.
pub fn required(name: &str, value: Option<String>) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingRequired(name.to_string()))
}

/// Turns a `LOG_LEVEL` value into an `EnvFilter` directive. `WARNING`,
/// `CRITICAL` and `FATAL` map onto tracing levels; anything else passes through.
pub fn log_directive(level: &str) -> String {
    let level = level.trim();
    match level.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        "trace" | "debug" | "info" | "warn" | "error" | "off" => level.to_ascii_lowercase(),
        _ => level.to_string(),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
