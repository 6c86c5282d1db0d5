//! Request execution logic (single attempt).
//!
//! Retries and endpoint rotation live in the caller's loop; every function here talks to
//! exactly one base URL once.

use crate::client::core::GenerationClient;
use crate::client::paths;
use crate::pipeline::NdjsonDecoder;
use crate::transport::http::endpoint_url;
use crate::transport::TransportError;
use crate::types::wire::{GenerateRequestBody, GenerateResponse};
use crate::{BoxStream, ChunkStream, Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use std::future::Future;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

impl GenerationClient {
    /// One non-streaming generate call against `base_url`.
    pub(crate) async fn generate_once(
        &self,
        base_url: &str,
        model: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let url = endpoint_url(base_url, paths::GENERATE);
        let request_id = Uuid::new_v4().to_string();
        let body = GenerateRequestBody {
            model,
            prompt,
            stream: false,
        };
        let start = Instant::now();
        debug!(
            endpoint = url.as_str(),
            request_id = request_id.as_str(),
            model,
            "generate attempt"
        );

        let attempt = async {
            let resp = self.transport.post_json(&url, &body, &request_id).await?;
            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(Error::remote(status.as_u16(), url.as_str(), &text));
            }
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| Error::Transport(TransportError::Http(e)))?;
            let parsed: GenerateResponse = serde_json::from_slice(&bytes)?;
            Ok(parsed.response)
        };

        let result = self.bounded(cancel, attempt).await;
        match &result {
            Ok(text) => info!(
                endpoint = url.as_str(),
                request_id = request_id.as_str(),
                duration_ms = start.elapsed().as_millis() as u64,
                response_chars = text.chars().count(),
                "generate completed"
            ),
            Err(e) => log_failure("generate", &url, &request_id, start, e),
        }
        result
    }

    /// Open one stream against `base_url`. The attempt ends once the response head arrives;
    /// the body is consumed lazily by the returned stream.
    pub(crate) async fn stream_once(
        &self,
        base_url: &str,
        model: &str,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<ChunkStream> {
        let url = endpoint_url(base_url, paths::GENERATE);
        let request_id = Uuid::new_v4().to_string();
        let body = GenerateRequestBody {
            model,
            prompt,
            stream: true,
        };
        let start = Instant::now();
        debug!(
            endpoint = url.as_str(),
            request_id = request_id.as_str(),
            model,
            "stream attempt"
        );

        let attempt = async {
            let resp = self.transport.post_json(&url, &body, &request_id).await?;
            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(Error::remote(status.as_u16(), url.as_str(), &text));
            }
            Ok(resp)
        };

        let resp = match self.bounded(cancel, attempt).await {
            Ok(resp) => resp,
            Err(e) => {
                log_failure("stream", &url, &request_id, start, &e);
                return Err(e);
            }
        };
        info!(
            endpoint = url.as_str(),
            request_id = request_id.as_str(),
            http_status = resp.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "stream opened"
        );

        let bytes: BoxStream<'static, Bytes> = Box::pin(
            resp.bytes_stream()
                .map_err(|e| Error::Transport(TransportError::Http(e))),
        );
        Ok(NdjsonDecoder::new(cancel.clone())
            .with_idle_timeout(self.config.timeout)
            .decode_stream(bytes))
    }

    /// Run `fut` under the configured timeout, giving up early if `cancel` fires.
    pub(crate) async fn bounded<T, F>(&self, cancel: &CancellationToken, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let limit = self.config.timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::cancelled()),
            res = tokio::time::timeout(limit, fut) => match res {
                Ok(res) => res,
                Err(_) => Err(Error::timed_out(limit)),
            },
        }
    }
}

fn log_failure(operation: &str, url: &str, request_id: &str, start: Instant, err: &Error) {
    info!(
        operation,
        endpoint = url,
        request_id,
        http_status = err.status(),
        duration_ms = start.elapsed().as_millis() as u64,
        error = %err,
        "attempt failed"
    );
}
