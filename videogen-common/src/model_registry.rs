use std::sync::Arc;

use global_constants::BASIC_MAX_PROMPT_LENGTH;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::{
    hosted::zeroscope_at, ModelDescriptor, COGVIDEOX_2B_LOCAL_MODEL, COGVIDEOX_2B_MODEL,
    COGVIDEOX_5B_MODEL, DEMO_MODEL, HUNYUAN_VIDEO_MODEL, REPLICATE_COGVIDEOX_MODEL,
    REPLICATE_HAILUO_MODEL, REPLICATE_HUNYUAN_MODEL, REPLICATE_LUMA_MODEL,
    REPLICATE_RUNWAY_MODEL, STABLE_VIDEO_DIFFUSION_MODEL, TEST_MODEL, ZEROSCOPE_MODEL,
};
use crate::prompt::PromptLimits;
use crate::types::{GenerationType, ModelSummary, VideoGenError};

/// Deployment preset: which models are offered and how long prompts may be.
#[derive(
    Serialize,
    Deserialize,
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Profile {
    /// Hosted inference spaces
    #[default]
    Hosted,
    /// A single hosted space with the shorter prompt bound
    Basic,
    /// Paid inference API
    Replicate,
    /// Local diffusion pipeline
    Local,
    /// Sample videos only
    Demo,
}

impl Profile {
    pub fn prompt_limits(&self) -> PromptLimits {
        match self {
            Self::Basic => PromptLimits::with_max(BASIC_MAX_PROMPT_LENGTH),
            _ => PromptLimits::default(),
        }
    }
}

/// Fixed, read-only mapping from model id to descriptor.
#[derive(Clone, Debug)]
pub struct ModelRegistry {
    models: IndexMap<String, Arc<ModelDescriptor>>,
    default: Arc<ModelDescriptor>,
}

impl ModelRegistry {
    /// Fails if `default_id` is not among `models`.
    pub fn new(models: Vec<ModelDescriptor>, default_id: &str) -> Result<Self, VideoGenError> {
        let models: IndexMap<_, _> = models
            .into_iter()
            .map(|m| (m.id.clone(), Arc::new(m)))
            .collect();
        let default = models.get(default_id).cloned().ok_or_else(|| {
            VideoGenError::Internal(format!("default model {default_id} is not registered"))
        })?;
        Ok(Self { models, default })
    }

    pub fn for_profile(profile: Profile) -> Self {
        Self::for_profile_with_space(profile, None)
    }

    /// `space_override` repoints zeroscope in the basic profile.
    pub fn for_profile_with_space(profile: Profile, space_override: Option<&str>) -> Self {
        let demo = [DEMO_MODEL.clone(), TEST_MODEL.clone()];
        let (mut models, default_index) = match profile {
            Profile::Hosted => (
                vec![
                    ZEROSCOPE_MODEL.clone(),
                    COGVIDEOX_5B_MODEL.clone(),
                    COGVIDEOX_2B_MODEL.clone(),
                    HUNYUAN_VIDEO_MODEL.clone(),
                    STABLE_VIDEO_DIFFUSION_MODEL.clone(),
                ],
                1,
            ),
            Profile::Basic => (
                vec![space_override
                    .map(zeroscope_at)
                    .unwrap_or_else(|| ZEROSCOPE_MODEL.clone())],
                0,
            ),
            Profile::Replicate => (
                vec![
                    REPLICATE_HAILUO_MODEL.clone(),
                    REPLICATE_COGVIDEOX_MODEL.clone(),
                    REPLICATE_HUNYUAN_MODEL.clone(),
                    REPLICATE_LUMA_MODEL.clone(),
                    REPLICATE_RUNWAY_MODEL.clone(),
                ],
                0,
            ),
            Profile::Local => (vec![COGVIDEOX_2B_LOCAL_MODEL.clone()], 0),
            Profile::Demo => (Vec::new(), 0),
        };
        models.extend(demo);

        let models: IndexMap<_, _> = models
            .into_iter()
            .map(|m| (m.id.clone(), Arc::new(m)))
            .collect();
        let default = models[default_index].clone();
        Self { models, default }
    }

    /// Makes `id` the default if it is registered. Returns whether it was.
    pub fn set_default(&mut self, id: &str) -> bool {
        match self.models.get(id) {
            Some(model) => {
                self.default = model.clone();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<ModelDescriptor>> {
        self.models.get(id).cloned()
    }

    /// Never fails: unknown ids resolve to the default descriptor.
    pub fn get_model_info(&self, id: &str) -> Arc<ModelDescriptor> {
        self.get(id).unwrap_or_else(|| self.default.clone())
    }

    pub fn default_model(&self) -> Arc<ModelDescriptor> {
        self.default.clone()
    }

    /// Model used when a request names none. Image requests prefer the first
    /// real image-to-video model.
    pub fn default_for(&self, operation: GenerationType) -> Arc<ModelDescriptor> {
        if self.default.generation_type == operation {
            return self.default.clone();
        }
        self.models
            .values()
            .find(|m| !m.is_demo() && m.generation_type == operation)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }

    /// Public listing: name, description, type. Endpoints and presets stay internal.
    pub fn get_available_models(&self) -> IndexMap<String, ModelSummary> {
        self.models
            .values()
            .filter(|m| !m.is_internal)
            .map(|m| (m.id.clone(), m.summary()))
            .collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModelDescriptor>> {
        self.models.values()
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::models::BackendRef;

    #[test]
    fn unknown_id_falls_back_to_default() {
        let registry = ModelRegistry::for_profile(Profile::Hosted);
        let info = registry.get_model_info("does-not-exist");
        assert_eq!(info.id, "cogvideox-5b");
        assert!(registry.get("does-not-exist").is_none());
    }

    #[test]
    fn known_id_resolves_to_itself() {
        let registry = ModelRegistry::for_profile(Profile::Hosted);
        assert_eq!(registry.get_model_info("hunyuan-video").id, "hunyuan-video");
        assert_eq!(
            registry.get_model_info("stable-video-diffusion").generation_type,
            GenerationType::ImageToVideo
        );
    }

    #[test]
    fn available_models_hide_internal_fields_and_models() {
        let registry = ModelRegistry::for_profile(Profile::Hosted);
        let models = registry.get_available_models();
        assert!(models.contains_key("demo"));
        assert!(!models.contains_key("test"));

        let json = serde_json::to_value(&models).unwrap();
        let cog = &json["cogvideox-5b"];
        assert_eq!(cog["type"], "text-to-video");
        assert_eq!(cog["name"], "CogVideoX-5B (THUDM)");
        assert_eq!(cog["features"], serde_json::json!(["high_quality", "longer_videos"]));
        assert!(cog.get("space_url").is_none());
        assert!(cog.get("params").is_none());
    }

    #[test]
    fn every_profile_has_demo_and_test() {
        for profile in Profile::iter() {
            let registry = ModelRegistry::for_profile(profile);
            assert!(registry.get("demo").is_some(), "{profile}");
            assert!(registry.get("test").is_some(), "{profile}");
        }
        assert_eq!(
            ModelRegistry::for_profile(Profile::Demo).default_model().id,
            "demo"
        );
    }

    #[test]
    fn basic_profile_uses_shorter_bound_and_space_override() {
        assert_eq!(Profile::Basic.prompt_limits().max, 500);
        assert_eq!(Profile::Hosted.prompt_limits().max, 1000);

        let registry =
            ModelRegistry::for_profile_with_space(Profile::Basic, Some("https://my.hf.space"));
        let zeroscope = registry.default_model();
        assert_eq!(zeroscope.id, "zeroscope");
        assert_eq!(
            zeroscope.backend,
            BackendRef::HostedSpace {
                space: "https://my.hf.space".into(),
                api_name: "/predict".into()
            }
        );
    }

    #[test]
    fn image_requests_default_to_an_image_model() {
        let registry = ModelRegistry::for_profile(Profile::Hosted);
        assert_eq!(
            registry.default_for(GenerationType::ImageToVideo).id,
            "stable-video-diffusion"
        );
        assert_eq!(
            registry.default_for(GenerationType::TextToVideo).id,
            "cogvideox-5b"
        );
    }

    #[test]
    fn set_default_ignores_unknown_ids() {
        let mut registry = ModelRegistry::for_profile(Profile::Hosted);
        assert!(!registry.set_default("zeroscope-xxl"));
        assert_eq!(registry.default_model().id, "cogvideox-5b");
        assert!(registry.set_default("zeroscope"));
        assert_eq!(registry.default_model().id, "zeroscope");
    }

    #[test]
    fn profile_parses_case_insensitively() {
        assert_eq!("Replicate".parse::<Profile>().unwrap(), Profile::Replicate);
        assert_eq!(Profile::Local.to_string(), "local");
        assert!("gpu-farm".parse::<Profile>().is_err());
    }

    #[test]
    fn new_rejects_missing_default() {
        let err = ModelRegistry::new(vec![DEMO_MODEL.clone()], "cogvideox-5b").unwrap_err();
        assert!(matches!(err, VideoGenError::Internal(_)));
    }
}
