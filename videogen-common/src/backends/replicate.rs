//! Paid inference API: create a prediction, then poll it until it settles.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use global_constants::{REPLICATE_API_BASE, REPLICATE_POLL_INTERVAL_SECS};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    http_client, map_reqwest_error, status_error, BackendAdapter, BackendHandle, BackendSettings,
};
use crate::models::{BackendCall, BackendKind, BackendRef, ModelDescriptor};
use crate::types::VideoGenError;

#[derive(Deserialize, Debug)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Deserialize, Debug)]
struct PredictionUrls {
    get: String,
}

pub struct ReplicateAdapter {
    client: reqwest::Client,
    api_token: Option<String>,
    api_base: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl ReplicateAdapter {
    pub fn new(settings: &BackendSettings) -> Result<Self, VideoGenError> {
        Ok(Self {
            client: http_client(settings.timeout)?,
            api_token: settings.replicate_api_token.clone(),
            api_base: REPLICATE_API_BASE.to_string(),
            poll_interval: Duration::from_secs(REPLICATE_POLL_INTERVAL_SECS),
            timeout: settings.timeout,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

#[async_trait]
impl BackendAdapter for ReplicateAdapter {
    fn kind(&self) -> BackendKind {
        BackendKind::Replicate
    }

    async fn initialize(
        &self,
        model: &ModelDescriptor,
    ) -> Result<Arc<dyn BackendHandle>, VideoGenError> {
        if !matches!(model.backend, BackendRef::Replicate { .. }) {
            return Err(VideoGenError::Internal(format!(
                "model {} is not served by the prediction API",
                model.id
            )));
        }
        let api_token = self
            .api_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                VideoGenError::ServiceUnavailable("REPLICATE_API_TOKEN is not configured".into())
            })?;

        Ok(Arc::new(ReplicateHandle {
            client: self.client.clone(),
            api_token,
            api_base: self.api_base.trim_end_matches('/').to_string(),
            poll_interval: self.poll_interval,
            timeout: self.timeout,
        }))
    }
}

pub struct ReplicateHandle {
    client: reqwest::Client,
    api_token: String,
    api_base: String,
    poll_interval: Duration,
    timeout: Duration,
}

impl ReplicateHandle {
    async fn read_prediction(
        &self,
        context: &str,
        response: reqwest::Response,
    ) -> Result<Prediction, VideoGenError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(context, status, &body));
        }
        response
            .json()
            .await
            .map_err(|e| map_reqwest_error(context, e))
    }

    async fn fetch(&self, url: &str) -> Result<Prediction, VideoGenError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| map_reqwest_error("polling prediction", e))?;
        self.read_prediction("polling prediction", response).await
    }
}

#[async_trait]
impl BackendHandle for ReplicateHandle {
    async fn generate(&self, call: BackendCall) -> Result<Value, VideoGenError> {
        let BackendCall::Named { endpoint, input } = call else {
            return Err(VideoGenError::Internal(
                "the prediction API only takes named calls".to_string(),
            ));
        };

        let started = Instant::now();
        let url = format!("{}/models/{endpoint}/predictions", self.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&json!({ "input": input }))
            .send()
            .await
            .map_err(|e| map_reqwest_error(&format!("creating prediction on {endpoint}"), e))?;
        let mut prediction = self
            .read_prediction(&format!("creating prediction on {endpoint}"), response)
            .await?;
        log::info!("Prediction {} created on {endpoint}", prediction.id);

        loop {
            match prediction.status.as_str() {
                "succeeded" => return Ok(prediction.output.unwrap_or(Value::Null)),
                "failed" | "canceled" => {
                    let detail = prediction
                        .error
                        .map(|e| match e {
                            Value::String(s) => s,
                            other => other.to_string(),
                        })
                        .unwrap_or_else(|| format!("prediction {}", prediction.status));
                    return Err(VideoGenError::ProviderError(detail));
                }
                _ => {}
            }

            if started.elapsed() >= self.timeout {
                return Err(VideoGenError::Timeout(format!(
                    "prediction {} still {} after {}s",
                    prediction.id,
                    prediction.status,
                    self.timeout.as_secs()
                )));
            }

            let poll_url = match &prediction.urls {
                Some(urls) => urls.get.clone(),
                None => format!("{}/predictions/{}", self.api_base, prediction.id),
            };
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.fetch(&poll_url).await?;
        }
    }
}
