//! Backend adapters.
//!
//! An adapter turns a [`ModelDescriptor`] into a connected [`BackendHandle`].
//! Handles are cached per model id by [`crate::adapter_registry::AdapterRegistry`]
//! and receive calls already shaped by the descriptor's request builder.

pub mod hosted_space;
pub mod local_pipeline;
pub mod replicate;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use global_constants::{DEFAULT_BACKEND_TIMEOUT_SECS, DEFAULT_OUTPUT_DIR};
use serde_json::Value;

use crate::models::{BackendCall, BackendKind, ModelDescriptor};
use crate::types::VideoGenError;

pub use hosted_space::HostedSpaceAdapter;
pub use local_pipeline::LocalPipelineAdapter;
pub use replicate::ReplicateAdapter;

/// Connects to a backend family.
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Establish a connection for one model. Called at most once per model id
    /// unless concurrent first requests race.
    async fn initialize(
        &self,
        model: &ModelDescriptor,
    ) -> Result<Arc<dyn BackendHandle>, VideoGenError>;
}

/// A connected backend. Returns the raw backend value; the dispatcher extracts
/// the video location from it.
#[async_trait]
pub trait BackendHandle: Send + Sync {
    async fn generate(&self, call: BackendCall) -> Result<Value, VideoGenError>;

    async fn generate_from_image(&self, call: BackendCall) -> Result<Value, VideoGenError> {
        self.generate(call).await
    }
}

/// Credentials and limits shared by the built-in adapters.
#[derive(Clone, Debug)]
pub struct BackendSettings {
    pub hf_token: Option<String>,
    pub replicate_api_token: Option<String>,
    /// Client-side timeout for a single backend request
    pub timeout: Duration,
    pub pipeline_command: String,
    pub ffmpeg_path: String,
    pub output_dir: PathBuf,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            hf_token: None,
            replicate_api_token: None,
            timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            pipeline_command: "videogen-pipeline".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

/// Built-in adapters for every backend family.
pub fn default_adapters(
    settings: &BackendSettings,
) -> Result<Vec<Arc<dyn BackendAdapter>>, VideoGenError> {
    let hosted: Arc<dyn BackendAdapter> = Arc::new(HostedSpaceAdapter::new(settings)?);
    let replicate: Arc<dyn BackendAdapter> = Arc::new(ReplicateAdapter::new(settings)?);
    let local: Arc<dyn BackendAdapter> = Arc::new(LocalPipelineAdapter::from_settings(settings));
    Ok(vec![hosted, replicate, local])
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, VideoGenError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| VideoGenError::Internal(format!("failed to build HTTP client: {e}")))
}

/// Timeouts surface as `Timeout`, connection problems as `ServiceUnavailable`.
pub(crate) fn map_reqwest_error(context: &str, e: reqwest::Error) -> VideoGenError {
    if e.is_timeout() {
        VideoGenError::Timeout(format!("{context}: {e}"))
    } else if e.is_connect() || e.is_request() {
        VideoGenError::ServiceUnavailable(format!("{context}: {e}"))
    } else {
        VideoGenError::ProviderError(format!("{context}: {e}"))
    }
}

/// Maps a non-success HTTP status from a backend.
pub(crate) fn status_error(
    context: &str,
    status: reqwest::StatusCode,
    body: &str,
) -> VideoGenError {
    let detail = format!("{context}: HTTP {status}: {}", truncate(body, 500));
    match status.as_u16() {
        401 | 403 | 404 | 429 | 502 | 503 => VideoGenError::ServiceUnavailable(detail),
        408 | 504 => VideoGenError::Timeout(detail),
        _ => VideoGenError::ProviderError(detail),
    }
}

pub(crate) fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_map_to_kinds() {
        assert!(matches!(
            status_error("x", reqwest::StatusCode::SERVICE_UNAVAILABLE, ""),
            VideoGenError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            status_error("x", reqwest::StatusCode::GATEWAY_TIMEOUT, ""),
            VideoGenError::Timeout(_)
        ));
        assert!(matches!(
            status_error("x", reqwest::StatusCode::UNPROCESSABLE_ENTITY, "bad input"),
            VideoGenError::ProviderError(_)
        ));
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }
}
