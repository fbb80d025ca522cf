//! Request orchestration: validate, resolve the model, shape the backend call,
//! invoke the cached handle and normalize what comes back.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use global_constants::{
    DEFAULT_TEST_PROMPT, DEMO_NOTE, DEMO_VIDEO_URL, TEST_MODE_MODEL_ID, TEST_MODE_NOTE,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::adapter_registry::AdapterRegistry;
use crate::backends::{default_adapters, BackendSettings};
use crate::catalog::{CAMERA_MOVEMENTS, EXAMPLE_PROMPTS, VIDEO_STYLES, VISUAL_EFFECTS};
use crate::image_input::prepare_input_image;
use crate::model_registry::{ModelRegistry, Profile};
use crate::models::{BackendInput, ModelDescriptor};
use crate::prompt::{build_enhanced_prompt, PromptLimits};
use crate::types::{
    GenerationRequest, GenerationResult, GenerationType, HealthResponse, ImageGenerationRequest,
    InitializeResponse, ModelsResponse, TestVideoRequest, VideoGenError,
};

pub struct Dispatcher {
    profile: Profile,
    registry: ModelRegistry,
    adapters: AdapterRegistry,
    limits: PromptLimits,
    output_dir: Option<PathBuf>,
}

impl Dispatcher {
    pub fn new(profile: Profile, registry: ModelRegistry, adapters: AdapterRegistry) -> Self {
        Self {
            profile,
            registry,
            adapters,
            limits: profile.prompt_limits(),
            output_dir: None,
        }
    }

    /// Builds the registry for `profile` with the built-in adapters.
    ///
    /// `default_model` replaces the profile default when it names a registered
    /// model. `space_override` repoints the basic profile's space.
    pub fn from_settings(
        profile: Profile,
        settings: &BackendSettings,
        default_model: Option<&str>,
        space_override: Option<&str>,
    ) -> Result<Self, VideoGenError> {
        let mut registry = ModelRegistry::for_profile_with_space(profile, space_override);
        if let Some(id) = default_model {
            if !registry.set_default(id) {
                log::warn!("DEFAULT_MODEL {id} is not offered by the {profile} profile, ignoring");
            }
        }
        let adapters = AdapterRegistry::new(default_adapters(settings)?);
        Ok(Self::new(profile, registry, adapters).with_output_dir(&settings.output_dir))
    }

    /// Directory served by [`Self::resolve_download`].
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub async fn generate_video(&self, body: &[u8]) -> Result<GenerationResult, VideoGenError> {
        self.generate(parse_body(body)?).await
    }

    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResult, VideoGenError> {
        let prompt = self.limits.validate_prompt(request.prompt.as_deref())?;
        let model = self.resolve_model(request.model.as_deref(), GenerationType::TextToVideo)?;

        let enhanced = build_enhanced_prompt(
            &prompt,
            request.camera_movement.as_deref().unwrap_or_default(),
            request.visual_effect.as_deref().unwrap_or_default(),
            request.style.as_deref().unwrap_or_default(),
        );
        self.limits.check_enhanced(&enhanced)?;

        log::info!(
            "Generating video with {}: {}",
            model.id,
            preview(&enhanced)
        );

        let video_url = if model.is_demo() {
            DEMO_VIDEO_URL.to_string()
        } else {
            let input = BackendInput {
                prompt: &enhanced,
                image: None,
            };
            self.invoke(&model, GenerationType::TextToVideo, &input)
                .await?
        };

        log::info!("Video generated with {}: {video_url}", model.id);
        Ok(GenerationResult {
            video_url,
            prompt,
            enhanced_prompt: Some(enhanced),
            model: model.id.clone(),
            model_name: model.name.clone(),
            timestamp: Utc::now(),
            note: model.is_demo().then(|| DEMO_NOTE.to_string()),
        })
    }

    pub async fn generate_video_from_image(
        &self,
        body: &[u8],
    ) -> Result<GenerationResult, VideoGenError> {
        self.generate_from_image(parse_body(body)?).await
    }

    pub async fn generate_from_image(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<GenerationResult, VideoGenError> {
        let prompt = self.limits.validate_prompt(request.prompt.as_deref())?;
        let model = self.resolve_model(request.model.as_deref(), GenerationType::ImageToVideo)?;

        // Removed when it goes out of scope, whatever the outcome.
        let image = prepare_input_image(request.image.as_deref()).await?;

        log::info!(
            "Generating video from image with {}: {}",
            model.id,
            preview(&prompt)
        );

        let video_url = if model.is_demo() {
            DEMO_VIDEO_URL.to_string()
        } else {
            let input = BackendInput {
                prompt: &prompt,
                image: Some(image.path()),
            };
            self.invoke(&model, GenerationType::ImageToVideo, &input)
                .await?
        };

        log::info!("Video generated from image with {}: {video_url}", model.id);
        Ok(GenerationResult {
            video_url,
            prompt,
            enhanced_prompt: None,
            model: model.id.clone(),
            model_name: model.name.clone(),
            timestamp: Utc::now(),
            note: model.is_demo().then(|| DEMO_NOTE.to_string()),
        })
    }

    /// Always answers with the sample clip. An empty body is accepted.
    pub fn test_video(&self, body: &[u8]) -> Result<GenerationResult, VideoGenError> {
        let request: TestVideoRequest = if body.iter().all(u8::is_ascii_whitespace) {
            TestVideoRequest::default()
        } else {
            parse_body(body)?
        };
        let prompt = request
            .prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TEST_PROMPT.to_string());

        Ok(GenerationResult {
            video_url: DEMO_VIDEO_URL.to_string(),
            enhanced_prompt: Some(prompt.clone()),
            prompt,
            model: TEST_MODE_MODEL_ID.to_string(),
            model_name: "Test Mode (Demo Video)".to_string(),
            timestamp: Utc::now(),
            note: Some(TEST_MODE_NOTE.to_string()),
        })
    }

    /// Connects the default model's backend ahead of the first request.
    pub async fn initialize_default(&self) -> Result<InitializeResponse, VideoGenError> {
        let model = self.registry.default_model();
        let message = if model.is_demo() {
            "Demo model needs no backend"
        } else {
            self.adapters.acquire(&model).await?;
            "Model loaded successfully"
        };
        Ok(InitializeResponse {
            status: "success".to_string(),
            message: message.to_string(),
            model: model.id.clone(),
        })
    }

    pub fn health(&self) -> HealthResponse {
        let default = self.registry.default_model();
        let ready = default.is_demo() || self.adapters.is_ready(&default.id);
        HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            profile: self.profile.to_string(),
            client_initialized: ready,
            model_loaded: (self.profile == Profile::Local).then_some(ready),
            available_models: self.registry.get_available_models().into_keys().collect(),
            default_model: default.id.clone(),
        }
    }

    pub fn models(&self) -> ModelsResponse {
        ModelsResponse {
            models: self.registry.get_available_models(),
            camera_movements: CAMERA_MOVEMENTS.clone(),
            visual_effects: VISUAL_EFFECTS.clone(),
            video_styles: VIDEO_STYLES.clone(),
            example_prompts: EXAMPLE_PROMPTS.clone(),
            default_model: self.registry.default_model().id.clone(),
        }
    }

    /// Maps a download name to a file in the output directory. Names are
    /// restricted to a single path component.
    pub async fn resolve_download(&self, filename: &str) -> Result<PathBuf, VideoGenError> {
        let not_found = || VideoGenError::NotFound("Video not found".to_string());
        let output_dir = self.output_dir.as_ref().ok_or_else(not_found)?;

        let plain = !filename.is_empty()
            && !filename.starts_with('.')
            && filename
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !plain || filename.contains("..") {
            return Err(VideoGenError::BadRequest("Invalid filename".to_string()));
        }

        let path = output_dir.join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            _ => Err(not_found()),
        }
    }

    fn resolve_model(
        &self,
        requested: Option<&str>,
        operation: GenerationType,
    ) -> Result<Arc<ModelDescriptor>, VideoGenError> {
        let model = match requested.map(str::trim).filter(|id| !id.is_empty()) {
            Some(id) => self
                .registry
                .get(id)
                .ok_or_else(|| VideoGenError::BadRequest(format!("Invalid model: {id}")))?,
            None => self.registry.default_for(operation),
        };

        if !model.supports(operation) {
            return Err(VideoGenError::BadRequest(format!(
                "Model {} does not support {operation} generation",
                model.id
            )));
        }
        Ok(model)
    }

    async fn invoke(
        &self,
        model: &ModelDescriptor,
        operation: GenerationType,
        input: &BackendInput<'_>,
    ) -> Result<String, VideoGenError> {
        let call = model.request_for(input)?;
        let handle = self.adapters.acquire(model).await?;

        let raw = match operation {
            GenerationType::TextToVideo => handle.generate(call).await,
            GenerationType::ImageToVideo => handle.generate_from_image(call).await,
        }
        .inspect_err(|e| log::error!("Generation failed on {}: {e}", model.id))?;

        extract_video_location(&raw).ok_or_else(|| {
            log::error!("No video location in response from {}: {raw}", model.id);
            VideoGenError::UpstreamEmptyResult
        })
    }
}

/// Parses a JSON object body. Syntax errors and non-object bodies are told
/// apart from bodies with the wrong field types.
pub fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, VideoGenError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|_| VideoGenError::BadRequest("Request must be JSON".to_string()))?;
    if !value.is_object() {
        return Err(VideoGenError::BadRequest(
            "Invalid request body: expected a JSON object".to_string(),
        ));
    }
    serde_json::from_value(value)
        .map_err(|e| VideoGenError::BadRequest(format!("Invalid request body: {e}")))
}

/// Finds the video location in a backend response: the first element of an
/// array, then `video`, `url` or `path` of an object, or a string itself.
pub fn extract_video_location(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items.first().and_then(extract_video_location),
        Value::Object(map) => ["video", "url", "path"]
            .into_iter()
            .find_map(|key| map.get(key).and_then(extract_video_location)),
        _ => None,
    }
}

fn preview(prompt: &str) -> String {
    let head: String = prompt.chars().take(100).collect();
    if head.len() < prompt.len() {
        format!("{head}...")
    } else {
        head
    }
}
