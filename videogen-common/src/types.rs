use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// What a model produces its video from.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    ToSchema,
    strum_macros::Display,
    strum_macros::EnumString,
)]
pub enum GenerationType {
    #[serde(rename = "text-to-video")]
    #[strum(serialize = "text-to-video")]
    TextToVideo,
    #[serde(rename = "image-to-video")]
    #[strum(serialize = "image-to-video")]
    ImageToVideo,
}

/// Non-string JSON values are treated as absent so the validator can reject them
/// with its own message instead of a deserialization error.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Body of `POST /generate-video`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, ToSchema)]
pub struct GenerationRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    #[schema(example = "A golden retriever running through a field of flowers at sunset")]
    pub prompt: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schema(example = "cogvideox-5b")]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schema(example = "[Zoom in]")]
    pub camera_movement: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schema(example = "cinematic lighting, film grain")]
    pub visual_effect: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schema(example = "photorealistic, 4k, high detail")]
    pub style: Option<String>,
}

/// Body of `POST /generate-video-from-image`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, ToSchema)]
pub struct ImageGenerationRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub prompt: Option<String>,
    /// Base64 image, optionally as a `data:` URL
    #[serde(default, deserialize_with = "lenient_string")]
    #[schema(
        example = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg=="
    )]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    #[schema(example = "stable-video-diffusion")]
    pub model: Option<String>,
}

/// Body of `POST /test-video`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, ToSchema)]
pub struct TestVideoRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub prompt: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct GenerationResult {
    pub video_url: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_prompt: Option<String>,
    pub model: String,
    pub model_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Caller-safe projection of a model descriptor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct ModelSummary {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub generation_type: GenerationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "6s")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, ToSchema)]
pub struct EnhancementOption {
    #[schema(example = "Zoom In")]
    pub name: String,
    #[schema(example = "[Zoom in]")]
    pub tag: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct ModelsResponse {
    pub models: IndexMap<String, ModelSummary>,
    pub camera_movements: Vec<EnhancementOption>,
    pub visual_effects: Vec<EnhancementOption>,
    pub video_styles: Vec<EnhancementOption>,
    pub example_prompts: IndexMap<String, Vec<String>>,
    pub default_model: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[schema(example = "hosted")]
    pub profile: String,
    pub client_initialized: bool,
    /// Only reported by the local pipeline profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_loaded: Option<bool>,
    pub available_models: Vec<String>,
    pub default_model: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct InitializeResponse {
    #[schema(example = "success")]
    pub status: String,
    pub message: String,
    pub model: String,
}

/// Envelope for every error response.
#[derive(Serialize, Deserialize, Clone, Debug, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, thiserror::Error, ToSchema)]
pub enum VideoGenError {
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Backend timed out: {0}")]
    Timeout(String),
    #[error("Backend returned no video location")]
    UpstreamEmptyResult,
    #[error("Provider error: {0}")]
    ProviderError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VideoGenError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::ServiceUnavailable(_) => 503,
            Self::Timeout(_) => 504,
            Self::UpstreamEmptyResult | Self::ProviderError(_) | Self::Internal(_) => 500,
        }
    }

    /// Message safe to hand back to callers. Backend detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            Self::ServiceUnavailable(_) => "Failed to connect to video generation service. \
                 Try using \"Demo Mode\" model to test the UI."
                .to_string(),
            Self::Timeout(_) => {
                "Request timed out. The service may be busy. Please try again.".to_string()
            }
            Self::UpstreamEmptyResult => {
                "Failed to generate video. No output received.".to_string()
            }
            Self::ProviderError(_) => {
                "Video generation failed. Please try again later.".to_string()
            }
            Self::Internal(_) => {
                "An unexpected error occurred. Please try again later.".to_string()
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::BadRequest(_) | Self::NotFound(_))
    }
}

impl From<std::io::Error> for VideoGenError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(format!("I/O error: {e}"))
    }
}
