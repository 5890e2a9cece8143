//! Completion notifiers.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};

use tileforge_core::config::CallbackConfig;
use tileforge_core::error::{AppError, ErrorKind};
use tileforge_core::result::AppResult;
use tileforge_core::traits::notifier::CompletionNotifier;
use tileforge_core::types::id::MapId;
use tileforge_core::types::metadata::PyramidMetadata;

use crate::error::CallbackError;

/// Posts pyramid metadata to `{base_url}/maps/{map_id}/tiles_info`.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpNotifier {
    /// Create a notifier with the configured base URL and timeout.
    pub fn new(config: &CallbackConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Configuration,
                    "Failed to build callback HTTP client",
                    e,
                )
            })?;

        Ok(Self {
            client,
            base_url: config.map_service_url.trim_end_matches('/').to_string(),
        })
    }

    /// Callback URL for a map.
    pub fn endpoint(&self, map_id: &MapId) -> String {
        format!("{}/maps/{}/tiles_info", self.base_url, map_id)
    }

    async fn post(&self, url: String, metadata: &PyramidMetadata) -> Result<(), CallbackError> {
        let response = match self.client.post(&url).json(metadata).send().await {
            Ok(response) => response,
            Err(source) => return Err(CallbackError::Transport { url, source }),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallbackError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        debug!(url = %url, status = status.as_u16(), "Callback acknowledged");
        Ok(())
    }
}

#[async_trait]
impl CompletionNotifier for HttpNotifier {
    async fn notify(&self, map_id: &MapId, metadata: &PyramidMetadata) -> AppResult<()> {
        Ok(self.post(self.endpoint(map_id), metadata).await?)
    }
}

/// Logs the metadata instead of delivering it. Used for local one-shot runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl CompletionNotifier for LoggingNotifier {
    async fn notify(&self, map_id: &MapId, metadata: &PyramidMetadata) -> AppResult<()> {
        info!(
            map_id = %map_id,
            width = metadata.width,
            height = metadata.height,
            max_zoom = metadata.max_zoom,
            tiles_path = %metadata.tiles_path,
            "Callback skipped"
        );
        Ok(())
    }
}
