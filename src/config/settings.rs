//! # Configuration Settings
//!
//! Defines the configuration structures for the n8n MCP server.

use crate::errors::{Error, Result};
use std::fmt;
use std::time::Duration;
use validator::Validate;

/// Fixed timeout applied to every upstream request unless overridden
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Path suffix of the n8n public REST API
const API_PATH_SUFFIX: &str = "/api/v1";

/// Connection settings for the upstream n8n instance
#[derive(Clone, Validate)]
pub struct N8nConfig {
    /// Base URL of the REST API, including `/api/v1`
    #[validate(url(message = "N8N_API_URL must be a valid URL"))]
    pub api_url: String,

    /// Pre-issued API key sent as `X-N8N-API-KEY`
    #[validate(length(min = 1, message = "N8N_API_KEY cannot be empty"))]
    pub api_key: String,

    /// Basic-auth user for webhook calls
    pub webhook_username: Option<String>,

    /// Basic-auth password for webhook calls
    pub webhook_password: Option<String>,

    /// Log every upstream request and response status
    pub debug: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300, message = "Timeout must be between 1 and 300 seconds"))]
    pub timeout_seconds: u64,
}

// The API key and webhook password never reach logs.
impl fmt::Debug for N8nConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("N8nConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("webhook_username", &self.webhook_username)
            .field("webhook_password", &self.webhook_password.as_ref().map(|_| "<redacted>"))
            .field("debug", &self.debug)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl N8nConfig {
    /// Create a configuration with the required values and defaults for everything else
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            webhook_username: None,
            webhook_password: None,
            debug: false,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup
    ///
    /// Missing required values are reported as configuration errors; the result is
    /// validated before it is returned.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = non_empty("N8N_API_URL")
            .ok_or_else(|| Error::config("N8N_API_URL environment variable is required"))?;
        let api_key = non_empty("N8N_API_KEY")
            .ok_or_else(|| Error::config("N8N_API_KEY environment variable is required"))?;

        let timeout_seconds = match non_empty("N8N_TIMEOUT_SECONDS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| Error::config(format!("Invalid N8N_TIMEOUT_SECONDS: {}", e)))?,
            None => DEFAULT_TIMEOUT_SECONDS,
        };

        let config = Self {
            api_url: api_url.trim().to_string(),
            api_key: api_key.trim().to_string(),
            webhook_username: non_empty("N8N_WEBHOOK_USERNAME"),
            webhook_password: non_empty("N8N_WEBHOOK_PASSWORD"),
            debug: non_empty("DEBUG").map(|v| parse_flag(&v)).unwrap_or(false),
            timeout_seconds,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self).map_err(Error::from)?;
        self.validate_custom()
    }

    fn validate_custom(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.api_url)
            .map_err(|e| Error::config(format!("Invalid N8N_API_URL: {}", e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "N8N_API_URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        if self.webhook_username.is_some() != self.webhook_password.is_some() {
            return Err(Error::config(
                "N8N_WEBHOOK_USERNAME and N8N_WEBHOOK_PASSWORD must be set together",
            ));
        }

        Ok(())
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// API base URL without a trailing slash
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Instance root used for webhook calls (the API URL minus `/api/v1`)
    pub fn instance_base(&self) -> &str {
        let base = self.api_base();
        base.strip_suffix(API_PATH_SUFFIX).unwrap_or(base)
    }

    /// Webhook basic-auth credentials, when configured
    pub fn webhook_credentials(&self) -> Option<(&str, &str)> {
        match (&self.webhook_username, &self.webhook_password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Validate)]
pub struct ObservabilityConfig {
    /// Log filter directive (trace, debug, info, warn, error, or a full `EnvFilter` string)
    #[validate(length(min = 1, message = "Log level cannot be empty"))]
    pub log_level: String,

    /// Enable JSON structured logging
    pub json_logging: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

impl ObservabilityConfig {
    /// Create logging configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create logging configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            log_level: lookup("RUST_LOG")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.log_level),
            json_logging: lookup("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.json_logging),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
