use crate::client::builder::ClientBuilder;
use crate::client::policy::{Decision, PolicyEngine};
use crate::config::ClientConfig;
use crate::routing::ModelSelectionPolicy;
use crate::transport::HttpTransport;
use crate::types::{GenerationRequest, QueryClassification};
use crate::{ChunkStream, Error, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Client for a local text-generation backend.
///
/// Cheap to clone: configuration, model policy and the connection pool are shared.
/// Failures are returned as raw [`Error`]s; use [`crate::classify`] to turn one into an
/// [`crate::ErrorRecord`].
#[derive(Debug, Clone)]
pub struct GenerationClient {
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) models: Arc<ModelSelectionPolicy>,
    pub(crate) transport: Arc<HttpTransport>,
}

impl GenerationClient {
    /// Client with the default model policy.
    pub fn new(config: ClientConfig) -> Result<Self> {
        ClientBuilder::new().config(config).build()
    }

    /// Client configured from `TEXTGEN_*` environment variables.
    pub fn from_env() -> Result<Self> {
        ClientBuilder::from_env().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub(crate) fn from_parts(config: ClientConfig, models: ModelSelectionPolicy) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self {
            config: Arc::new(config),
            models: Arc::new(models),
            transport: Arc::new(transport),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn model_policy(&self) -> &ModelSelectionPolicy {
        &self.models
    }

    pub fn select_model(&self, classification: QueryClassification) -> &str {
        self.models.select(classification)
    }

    /// Generate a complete response for `prompt`.
    ///
    /// Returns the backend's `response` verbatim, which may be empty.
    pub async fn generate(
        &self,
        prompt: &str,
        classification: QueryClassification,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let model = self.select_model(classification).to_string();
        debug!(model = model.as_str(), %classification, "generate");
        self.with_retries("generate", cancel, move |base_url| {
            let model = model.clone();
            async move {
                self.generate_once(&base_url, &model, prompt, cancel)
                    .await
            }
        })
        .await
    }

    /// Stream a response for `prompt` as it is produced.
    ///
    /// Retries only cover establishing the stream; once the first byte of the body is read,
    /// failures are yielded as items and the stream ends.
    pub async fn stream_generate(
        &self,
        prompt: &str,
        classification: QueryClassification,
        cancel: &CancellationToken,
    ) -> Result<ChunkStream> {
        let model = self.select_model(classification).to_string();
        debug!(model = model.as_str(), %classification, "stream_generate");
        self.with_retries("stream_generate", cancel, move |base_url| {
            let model = model.clone();
            async move { self.stream_once(&base_url, &model, prompt, cancel).await }
        })
        .await
    }

    pub async fn generate_request(&self, request: &GenerationRequest) -> Result<String> {
        self.generate(&request.prompt, request.classification, &request.cancel)
            .await
    }

    pub async fn stream_request(
        &self,
        request: &GenerationRequest,
    ) -> Result<ChunkStream> {
        self.stream_generate(&request.prompt, request.classification, &request.cancel)
            .await
    }

    /// Policy-driven attempt loop: rotates through the configured endpoints and sleeps
    /// `retry_delay` between attempts. Returns the last raw failure when giving up.
    pub(crate) async fn with_retries<T, F, Fut>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        mut attempt_fn: F,
    ) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let endpoints: Vec<&str> = self.config.endpoints().collect();
        let policy = PolicyEngine::new(&self.config, endpoints.len());
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            let base_url = endpoints[policy.endpoint_index(attempt)].to_string();
            let err = match attempt_fn(base_url.clone()).await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(
                            operation,
                            attempt,
                            endpoint = base_url.as_str(),
                            duration_ms = started.elapsed().as_millis() as u64,
                            "succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            match policy.decide(&err, attempt, cancel) {
                Decision::Retry { delay } => {
                    warn!(
                        operation,
                        attempt,
                        endpoint = base_url.as_str(),
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, retrying"
                    );
                    let cancelled = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => true,
                        _ = tokio::time::sleep(delay) => false,
                    };
                    if cancelled {
                        return Err(Error::cancelled());
                    }
                    attempt += 1;
                }
                Decision::Fail => {
                    debug!(
                        operation,
                        attempts = attempt + 1,
                        endpoint = base_url.as_str(),
                        error = %err,
                        "giving up"
                    );
                    return Err(err);
                }
            }
        }
    }
}
