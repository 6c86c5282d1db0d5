//! Client configuration: defaults, environment overrides, YAML files and validation.
//!
//! ```yaml
//! base_url: http://localhost:11434
//! timeout_secs: 60
//! max_retry_attempts: 3
//! retry_delay_ms: 1000
//! alternate_endpoints:
//!   - http://gpu-box:11434
//! models:
//!   default_model: llama3
//!   overrides:
//!     code: codellama
//! ```

use crate::routing::ModelSelectionPolicy;
use crate::{Error, ErrorContext, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Settings for one [`crate::GenerationClient`].
///
/// The client takes its own copy at construction and never changes it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Bounds one whole request attempt.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Re-attempts after the first failure; `0` disables retries.
    pub max_retry_attempts: u32,
    pub retry_delay: Duration,
    /// Tried in order after `base_url` when retrying.
    pub alternate_endpoints: Vec<String>,
    /// Sent as `Authorization: Bearer <key>` when set.
    pub api_key: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
            alternate_endpoints: Vec::new(),
            api_key: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `TEXTGEN_*` environment variables.
    ///
    /// Unparsable values are ignored rather than rejected.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = env_string("TEXTGEN_BASE_URL") {
            self.base_url = url;
        }
        if let Some(secs) = env_parse::<u64>("TEXTGEN_TIMEOUT_SECS") {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("TEXTGEN_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = env_parse::<u32>("TEXTGEN_MAX_RETRIES") {
            self.max_retry_attempts = n;
        }
        if let Some(ms) = env_parse::<u64>("TEXTGEN_RETRY_DELAY_MS") {
            self.retry_delay = Duration::from_millis(ms);
        }
        if let Some(list) = env_string("TEXTGEN_ALTERNATE_ENDPOINTS") {
            self.alternate_endpoints = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(key) = env_string("TEXTGEN_API_KEY") {
            self.api_key = Some(key);
        }
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(Settings::from_yaml_str(yaml)?.client)
    }

    /// `base_url` followed by the alternates, in retry order.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.base_url.as_str()).chain(self.alternate_endpoints.iter().map(String::as_str))
    }

    /// Reject configurations the client cannot work with.
    pub fn validate(&self) -> Result<()> {
        validate_url(&self.base_url, "base_url")?;
        for (idx, alt) in self.alternate_endpoints.iter().enumerate() {
            validate_url(alt, &format!("alternate_endpoints[{idx}]"))?;
        }
        if self.timeout.is_zero() {
            return Err(Error::configuration_with_context(
                "timeout must be greater than zero",
                ErrorContext::new()
                    .with_field_path("timeout")
                    .with_source("config_validation"),
            ));
        }
        Ok(())
    }
}

fn validate_url(raw: &str, field: &str) -> Result<()> {
    let ctx = || {
        ErrorContext::new()
            .with_field_path(field)
            .with_source("config_validation")
    };
    if raw.trim().is_empty() {
        return Err(Error::configuration_with_context(
            format!("{field} is required"),
            ctx(),
        ));
    }
    let parsed = url::Url::parse(raw).map_err(|e| {
        Error::configuration_with_context(
            format!("{field} is not a valid URL"),
            ctx().with_details(format!("{raw}: {e}")),
        )
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(Error::configuration_with_context(
            format!("{field} must use http or https"),
            ctx().with_details(raw.to_string()),
        ));
    }
    Ok(())
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.trim().parse::<T>().ok())
}

/// Everything a configuration file can carry: client settings plus the model policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub client: ClientConfig,
    pub models: ModelSelectionPolicy,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    max_retry_attempts: Option<u32>,
    retry_delay_ms: Option<u64>,
    alternate_endpoints: Option<Vec<String>>,
    api_key: Option<String>,
    models: Option<ModelSelectionPolicy>,
}

impl Settings {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: SettingsFile = serde_yaml::from_str(yaml).map_err(|e| {
            Error::configuration_with_context(
                "invalid configuration file",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("config_file"),
            )
        })?;

        let defaults = ClientConfig::default();
        let client = ClientConfig {
            base_url: file.base_url.unwrap_or(defaults.base_url),
            timeout: file
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            connect_timeout: file
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            max_retry_attempts: file
                .max_retry_attempts
                .unwrap_or(defaults.max_retry_attempts),
            retry_delay: file
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            alternate_endpoints: file.alternate_endpoints.unwrap_or_default(),
            api_key: file.api_key,
        };
        client.validate()?;

        Ok(Self {
            client,
            models: file.models.unwrap_or_default(),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }
}
