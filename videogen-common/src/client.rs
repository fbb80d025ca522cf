use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{
    ErrorResponse, GenerationRequest, GenerationResult, HealthResponse, ImageGenerationRequest,
    InitializeResponse, ModelsResponse, TestVideoRequest, VideoGenError,
};

/// HTTP client for the video generation service.
pub struct VideoGenClient {
    base_url: Url,
    client: reqwest::Client,
}

impl VideoGenClient {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: Url, client: reqwest::Client) -> Self {
        Self { base_url, client }
    }

    pub async fn health(&self) -> Result<HealthResponse, VideoGenError> {
        self.get("health").await
    }

    /// Models, enhancement catalog and example prompts
    pub async fn models(&self) -> Result<ModelsResponse, VideoGenError> {
        self.get("models").await
    }

    pub async fn generate_video(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, VideoGenError> {
        self.post("generate-video", request).await
    }

    pub async fn generate_video_from_image(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<GenerationResult, VideoGenError> {
        self.post("generate-video-from-image", request).await
    }

    pub async fn test_video(
        &self,
        request: &TestVideoRequest,
    ) -> Result<GenerationResult, VideoGenError> {
        self.post("test-video", request).await
    }

    pub async fn initialize(&self) -> Result<InitializeResponse, VideoGenError> {
        let url = self.url("initialize")?;
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(|e| VideoGenError::ServiceUnavailable(e.to_string()))?;
        Self::read(response).await
    }

    fn url(&self, path: &str) -> Result<Url, VideoGenError> {
        self.base_url
            .join(path)
            .map_err(|e| VideoGenError::Internal(format!("Invalid URL: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, VideoGenError> {
        let response = self
            .client
            .get(self.url(path)?)
            .send()
            .await
            .map_err(|e| VideoGenError::ServiceUnavailable(e.to_string()))?;
        Self::read(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, VideoGenError> {
        let response = self
            .client
            .post(self.url(path)?)
            .json(body)
            .send()
            .await
            .map_err(|e| VideoGenError::ServiceUnavailable(e.to_string()))?;
        Self::read(response).await
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, VideoGenError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| VideoGenError::ProviderError(format!("Invalid response: {e}")));
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to get error text".to_string());
        let message = match serde_json::from_str::<ErrorResponse>(&error_text) {
            Ok(body) => body.error,
            Err(_) => error_text,
        };
        Err(error_for_status(status.as_u16(), message))
    }
}

/// Rebuilds the error kind from the status the server chose for it.
fn error_for_status(status: u16, message: String) -> VideoGenError {
    match status {
        400 | 405 => VideoGenError::BadRequest(message),
        404 => VideoGenError::NotFound(message),
        503 => VideoGenError::ServiceUnavailable(message),
        504 => VideoGenError::Timeout(message),
        _ => VideoGenError::ProviderError(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_round_trip_through_errors() {
        for err in [
            VideoGenError::BadRequest("Invalid model: x".into()),
            VideoGenError::NotFound("Video not found".into()),
            VideoGenError::ServiceUnavailable("down".into()),
            VideoGenError::Timeout("slow".into()),
        ] {
            let rebuilt = error_for_status(err.status_code(), err.public_message());
            assert_eq!(rebuilt.status_code(), err.status_code());
        }
        assert_eq!(
            error_for_status(400, "Invalid model: x".into()),
            VideoGenError::BadRequest("Invalid model: x".into())
        );
    }

    #[test]
    fn relative_paths_join_onto_base() {
        let client = VideoGenClient::new(Url::parse("http://localhost:5000/").unwrap());
        assert_eq!(
            client.url("generate-video").unwrap().as_str(),
            "http://localhost:5000/generate-video"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        let client = VideoGenClient::new(Url::parse("http://127.0.0.1:9/").unwrap());
        assert!(matches!(
            client.health().await,
            Err(VideoGenError::ServiceUnavailable(_))
        ));
    }
}
