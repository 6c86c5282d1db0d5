//! Model catalog calls (`GET /api/tags`)

use crate::client::core::GenerationClient;
use crate::client::paths;
use crate::transport::http::endpoint_url;
use crate::transport::TransportError;
use crate::types::wire::TagsResponse;
use crate::types::ModelInfo;
use crate::{Error, Result};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

impl GenerationClient {
    /// Installed models as reported by the primary endpoint.
    ///
    /// Single attempt against `base_url`, bounded by the configured timeout.
    pub async fn list_models(&self, cancel: &CancellationToken) -> Result<Vec<ModelInfo>> {
        let url = endpoint_url(&self.config.base_url, paths::TAGS);
        let request_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        let attempt = async {
            let resp = self.transport.get(&url, &request_id).await?;
            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(Error::remote(status.as_u16(), url.as_str(), &text));
            }
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| Error::Transport(TransportError::Http(e)))?;
            let tags: TagsResponse = serde_json::from_slice(&bytes)?;
            Ok(tags.models)
        };

        let models = self.bounded(cancel, attempt).await?;
        debug!(
            endpoint = url.as_str(),
            request_id = request_id.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            count = models.len(),
            "listed models"
        );
        Ok(models)
    }

    /// Names of the installed models; any failure degrades to an empty list.
    pub async fn get_available_models(&self, cancel: &CancellationToken) -> Vec<String> {
        match self.list_models(cancel).await {
            Ok(models) => models.into_iter().map(|m| m.name).collect(),
            Err(e) => {
                warn!(
                    endpoint = self.config.base_url.as_str(),
                    http_status = e.status(),
                    error = %e,
                    "model list unavailable, returning empty list"
                );
                Vec::new()
            }
        }
    }

    /// True when the backend answers the catalog request successfully.
    pub async fn is_available(&self, cancel: &CancellationToken) -> bool {
        match self.list_models(cancel).await {
            Ok(_) => true,
            Err(e) => {
                debug!(endpoint = self.config.base_url.as_str(), error = %e, "backend not available");
                false
            }
        }
    }

    /// Whether `name` is installed, matching either the full name or the name without its
    /// `:tag` suffix.
    pub async fn has_model(&self, name: &str, cancel: &CancellationToken) -> bool {
        self.list_models(cancel)
            .await
            .map(|models| models.iter().any(|m| m.name == name || m.base_name() == name))
            .unwrap_or(false)
    }
}
