use crate::config::ClientConfig;
use crate::Result;
use reqwest::{Proxy, Response};
use serde::Serialize;
use std::env;
use std::time::Duration;

/// Header carrying our per-attempt correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Thin wrapper over a pooled `reqwest::Client`.
///
/// Holds no per-request state, so one instance is shared by every call of a client.
/// Whole-attempt deadlines are enforced by the caller; only the connect phase is bounded here.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(
                env::var("TEXTGEN_HTTP_POOL_MAX_IDLE_PER_HOST")
                    .ok()
                    .and_then(|s| s.parse::<usize>().ok())
                    .unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(
                env::var("TEXTGEN_HTTP_POOL_IDLE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(90),
            )));

        if let Ok(proxy_url) = env::var("TEXTGEN_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
        })
    }

    /// POST a JSON body. Any HTTP status is returned as `Ok`; only transport failures are `Err`.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
        request_id: &str,
    ) -> Result<Response> {
        let req = self
            .client
            .post(url)
            .json(body)
            .header(REQUEST_ID_HEADER, request_id);
        self.send(req).await
    }

    pub async fn get(&self, url: &str, request_id: &str) -> Result<Response> {
        let req = self.client.get(url).header(REQUEST_ID_HEADER, request_id);
        self.send(req).await
    }

    async fn send(&self, mut req: reqwest::RequestBuilder) -> Result<Response> {
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req.send()
            .await
            .map_err(|e| crate::Error::Transport(TransportError::Http(e)))
    }
}

/// Join a base URL and an API path without doubling the slash.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
