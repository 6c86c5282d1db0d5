use crate::client::core::GenerationClient;
use crate::config::{ClientConfig, Settings};
use crate::routing::ModelSelectionPolicy;
use crate::Result;
use std::time::Duration;

/// Builder for creating clients with custom configuration.
///
/// Starts from [`ClientConfig::default`] and the default [`ModelSelectionPolicy`].
/// Nothing is validated until [`ClientBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    models: ModelSelectionPolicy,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `TEXTGEN_*` environment overrides.
    pub fn from_env() -> Self {
        Self {
            config: ClientConfig::from_env(),
            models: ModelSelectionPolicy::default(),
        }
    }

    /// Replace both the client settings and the model policy.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.config = settings.client;
        self.models = settings.models;
        self
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Bound for one whole attempt (and for each line read while streaming).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Re-attempts after the first failure. `0` disables retries.
    pub fn max_retry_attempts(mut self, attempts: u32) -> Self {
        self.config.max_retry_attempts = attempts;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    /// Append one fallback endpoint; endpoints are tried in insertion order.
    pub fn alternate_endpoint(mut self, base_url: impl Into<String>) -> Self {
        self.config.alternate_endpoints.push(base_url.into());
        self
    }

    pub fn alternate_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.alternate_endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model_policy(mut self, models: ModelSelectionPolicy) -> Self {
        self.models = models;
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> Result<GenerationClient> {
        GenerationClient::from_parts(self.config, self.models)
    }
}
