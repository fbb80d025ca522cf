//! Hosted inference spaces reached through their HTTP call API.
//!
//! A call is a two-step exchange: `POST {api}/call/{endpoint}` returns an
//! event id, and `GET {api}/call/{endpoint}/{event_id}` streams server-sent
//! events until a `complete` or `error` event arrives.

use std::path::Path;
use std::pin::pin;
use std::sync::Arc;

use async_trait::async_trait;
use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::{Stream, StreamExt};
use global_constants::HF_SPACES_API_BASE;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    http_client, map_reqwest_error, status_error, truncate, BackendAdapter, BackendHandle,
    BackendSettings,
};
use crate::models::{BackendCall, BackendKind, BackendRef, CallArg, ModelDescriptor};
use crate::types::VideoGenError;

#[derive(Deserialize)]
struct SpaceHost {
    host: String,
}

#[derive(Deserialize, Default)]
struct SpaceConfig {
    #[serde(default)]
    api_prefix: Option<String>,
}

#[derive(Deserialize)]
struct CallStarted {
    event_id: String,
}

pub struct HostedSpaceAdapter {
    client: reqwest::Client,
    hf_token: Option<String>,
    spaces_api: String,
}

impl HostedSpaceAdapter {
    pub fn new(settings: &BackendSettings) -> Result<Self, VideoGenError> {
        Ok(Self {
            client: http_client(settings.timeout)?,
            hf_token: settings.hf_token.clone(),
            spaces_api: HF_SPACES_API_BASE.to_string(),
        })
    }

    /// Points space-name lookups at a different registry.
    pub fn with_spaces_api(mut self, spaces_api: impl Into<String>) -> Self {
        self.spaces_api = spaces_api.into();
        self
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.hf_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Full URLs are used as-is; `owner/space` names are looked up.
    async fn resolve_host(&self, space: &str) -> Result<String, VideoGenError> {
        if space.starts_with("http://") || space.starts_with("https://") {
            return Ok(space.trim_end_matches('/').to_string());
        }

        let url = format!("{}/{space}/host", self.spaces_api.trim_end_matches('/'));
        let response = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| map_reqwest_error(&format!("looking up space {space}"), e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VideoGenError::ServiceUnavailable(format!(
                "space {space} lookup returned HTTP {status}: {}",
                truncate(&body, 200)
            )));
        }
        let host: SpaceHost = response
            .json()
            .await
            .map_err(|e| map_reqwest_error(&format!("looking up space {space}"), e))?;
        Ok(host.host.trim_end_matches('/').to_string())
    }
}

#[async_trait]
impl BackendAdapter for HostedSpaceAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::HostedSpace
    }

    async fn initialize(
        &self,
        model: &ModelDescriptor,
    ) -> Result<Arc<dyn BackendHandle>, VideoGenError> {
        let BackendRef::HostedSpace { space, .. } = &model.backend else {
            return Err(VideoGenError::Internal(format!(
                "model {} is not served by a hosted space",
                model.id
            )));
        };

        let host = self.resolve_host(space).await?;
        let response = self
            .authorized(self.client.get(format!("{host}/config")))
            .send()
            .await
            .map_err(|e| map_reqwest_error(&format!("connecting to {space}"), e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(VideoGenError::ServiceUnavailable(format!(
                "space {space} is not reachable (HTTP {status})"
            )));
        }
        // Older spaces serve no prefix, newer ones mount the API under one.
        let config: SpaceConfig = response.json().await.unwrap_or_default();
        let api_base = format!("{host}{}", config.api_prefix.unwrap_or_default());

        log::info!("Connected to space {space} at {api_base}");
        Ok(Arc::new(HostedSpaceHandle {
            client: self.client.clone(),
            hf_token: self.hf_token.clone(),
            api_base,
        }))
    }
}

pub struct HostedSpaceHandle {
    client: reqwest::Client,
    hf_token: Option<String>,
    api_base: String,
}

impl HostedSpaceHandle {
    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.hf_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn upload(&self, path: &Path) -> Result<Value, VideoGenError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input.png".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/png")
            .map_err(|e| VideoGenError::Internal(format!("invalid upload mime type: {e}")))?;
        let form = Form::new().part("files", part);

        let response = self
            .authorized(self.client.post(format!("{}/upload", self.api_base)))
            .multipart(form)
            .send()
            .await
            .map_err(|e| map_reqwest_error("uploading input image", e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("uploading input image", status, &body));
        }
        let paths: Vec<String> = response
            .json()
            .await
            .map_err(|e| map_reqwest_error("uploading input image", e))?;
        let remote = paths.into_iter().next().ok_or_else(|| {
            VideoGenError::ProviderError("upload returned no file path".to_string())
        })?;

        Ok(json!({
            "path": remote,
            "meta": { "_type": "gradio.FileData" },
        }))
    }

    async fn encode_args(&self, args: Vec<CallArg>) -> Result<Vec<Value>, VideoGenError> {
        let mut data = Vec::with_capacity(args.len());
        for arg in args {
            data.push(match arg {
                CallArg::Text(s) => Value::String(s),
                CallArg::Integer(n) => Value::from(n),
                CallArg::File(path) => self.upload(&path).await?,
            });
        }
        Ok(data)
    }
}

#[async_trait]
impl BackendHandle for HostedSpaceHandle {
    async fn generate(&self, call: BackendCall) -> Result<Value, VideoGenError> {
        let BackendCall::Positional { endpoint, args } = call else {
            return Err(VideoGenError::Internal(
                "hosted spaces only take positional calls".to_string(),
            ));
        };
        let endpoint = endpoint.trim_start_matches('/');
        let data = self.encode_args(args).await?;

        let call_url = format!("{}/call/{endpoint}", self.api_base);
        let response = self
            .authorized(self.client.post(&call_url))
            .json(&json!({ "data": data }))
            .send()
            .await
            .map_err(|e| map_reqwest_error(&format!("calling {endpoint}"), e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(&format!("calling {endpoint}"), status, &body));
        }
        let started: CallStarted = response
            .json()
            .await
            .map_err(|e| map_reqwest_error(&format!("calling {endpoint}"), e))?;

        let context = format!("waiting for {endpoint}");
        let response = self
            .authorized(self.client.get(format!("{call_url}/{}", started.event_id)))
            .send()
            .await
            .map_err(|e| map_reqwest_error(&context, e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(&context, status, &body));
        }

        let chunks = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| map_reqwest_error(&context, e)));
        read_event_stream(chunks).await
    }
}

/// Reads server-sent events until a `complete` or `error` event arrives.
pub(crate) async fn read_event_stream<S, B>(chunks: S) -> Result<Value, VideoGenError>
where
    S: Stream<Item = Result<B, VideoGenError>>,
    B: AsRef<[u8]>,
{
    let mut events = pin!(chunks.eventsource());
    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(EventStreamError::Transport(e)) => return Err(e),
            Err(e) => {
                return Err(VideoGenError::ProviderError(format!(
                    "malformed event stream: {e}"
                )))
            }
        };
        let data = event.data.trim();
        match event.event.as_str() {
            "complete" => {
                return serde_json::from_str(data).map_err(|e| {
                    VideoGenError::ProviderError(format!("malformed result payload: {e}"))
                });
            }
            "error" => {
                let detail = if data.is_empty() || data == "null" {
                    "space reported an error".to_string()
                } else {
                    truncate(data, 500)
                };
                return Err(VideoGenError::ProviderError(detail));
            }
            _ => {}
        }
    }

    Err(VideoGenError::ProviderError(
        "event stream ended without a result".to_string(),
    ))
}
