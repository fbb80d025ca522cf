pub mod demo;
pub mod hosted;
pub mod local;
pub mod replicate;

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::types::{GenerationType, ModelSummary, VideoGenError};

pub use demo::{DEMO_MODEL, TEST_MODEL};
pub use hosted::{
    COGVIDEOX_2B_MODEL, COGVIDEOX_5B_MODEL, HUNYUAN_VIDEO_MODEL, STABLE_VIDEO_DIFFUSION_MODEL,
    ZEROSCOPE_MODEL,
};
pub use local::COGVIDEOX_2B_LOCAL_MODEL;
pub use replicate::{
    REPLICATE_COGVIDEOX_MODEL, REPLICATE_HAILUO_MODEL, REPLICATE_HUNYUAN_MODEL,
    REPLICATE_LUMA_MODEL, REPLICATE_RUNWAY_MODEL,
};

/// Which adapter family serves a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum BackendKind {
    HostedSpace,
    LocalPipeline,
    Replicate,
    Demo,
}

/// Where a model lives.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendRef {
    /// A hosted inference space (`owner/space` or a full URL) and its named endpoint
    HostedSpace { space: String, api_name: String },
    LocalPipeline { checkpoint: String },
    /// Paid inference API model, `owner/name`
    Replicate { model: String },
    Demo,
}

impl BackendRef {
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::HostedSpace { .. } => BackendKind::HostedSpace,
            Self::LocalPipeline { .. } => BackendKind::LocalPipeline,
            Self::Replicate { .. } => BackendKind::Replicate,
            Self::Demo => BackendKind::Demo,
        }
    }
}

/// Default generation parameters for a model. Fields a backend does not take
/// are left at their defaults.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GenerationParams {
    pub frame_count: u32,
    pub width: u32,
    pub height: u32,
    pub guidance_scale: Option<f32>,
    pub inference_steps: Option<u32>,
    pub fps: Option<u32>,
}

/// What the dispatcher hands to a request builder.
#[derive(Clone, Copy, Debug)]
pub struct BackendInput<'a> {
    pub prompt: &'a str,
    pub image: Option<&'a Path>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CallArg {
    Text(String),
    Integer(i64),
    /// Local file that the adapter uploads before calling
    File(PathBuf),
}

/// A fully shaped backend call.
#[derive(Clone, Debug, PartialEq)]
pub enum BackendCall {
    Positional {
        endpoint: String,
        args: Vec<CallArg>,
    },
    Named {
        endpoint: String,
        input: Map<String, Value>,
    },
    Pipeline {
        prompt: String,
        frame_count: u32,
        inference_steps: u32,
        guidance_scale: f32,
        fps: u32,
    },
}

pub type RequestBuilder =
    fn(&ModelDescriptor, &BackendInput<'_>) -> Result<BackendCall, VideoGenError>;

#[derive(Clone, Debug)]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub generation_type: GenerationType,
    pub backend: BackendRef,
    pub params: GenerationParams,
    /// Capability tags shown next to the model
    pub features: &'static [&'static str],
    /// Display label such as "6s"
    pub duration: Option<String>,
    /// Hidden from `/models`
    pub is_internal: bool,
    pub build_request: RequestBuilder,
}

impl ModelDescriptor {
    pub fn is_demo(&self) -> bool {
        self.backend == BackendRef::Demo
    }

    /// Demo models answer both operations.
    pub fn supports(&self, operation: GenerationType) -> bool {
        self.is_demo() || self.generation_type == operation
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            generation_type: self.generation_type,
            duration: self.duration.clone(),
            features: self.features.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    pub fn request_for(&self, input: &BackendInput<'_>) -> Result<BackendCall, VideoGenError> {
        (self.build_request)(self, input)
    }

    fn endpoint(&self) -> Result<String, VideoGenError> {
        match &self.backend {
            BackendRef::HostedSpace { api_name, .. } => Ok(api_name.clone()),
            BackendRef::Replicate { model } => Ok(model.clone()),
            other => Err(VideoGenError::Internal(format!(
                "model {} has no named endpoint on backend {}",
                self.id,
                other.kind()
            ))),
        }
    }
}

fn required_image(
    descriptor: &ModelDescriptor,
    input: &BackendInput<'_>,
) -> Result<CallArg, VideoGenError> {
    input
        .image
        .map(|path| CallArg::File(path.to_path_buf()))
        .ok_or_else(|| {
            VideoGenError::Internal(format!("model {} requires an input image", descriptor.id))
        })
}

/// `(prompt, frame_count, width, height)`
pub fn prompt_with_dimensions(
    descriptor: &ModelDescriptor,
    input: &BackendInput<'_>,
) -> Result<BackendCall, VideoGenError> {
    let params = &descriptor.params;
    Ok(BackendCall::Positional {
        endpoint: descriptor.endpoint()?,
        args: vec![
            CallArg::Text(input.prompt.to_string()),
            CallArg::Integer(params.frame_count.into()),
            CallArg::Integer(params.width.into()),
            CallArg::Integer(params.height.into()),
        ],
    })
}

/// `(prompt)`
pub fn prompt_only(
    descriptor: &ModelDescriptor,
    input: &BackendInput<'_>,
) -> Result<BackendCall, VideoGenError> {
    Ok(BackendCall::Positional {
        endpoint: descriptor.endpoint()?,
        args: vec![CallArg::Text(input.prompt.to_string())],
    })
}

/// `(image)`
pub fn image_only(
    descriptor: &ModelDescriptor,
    input: &BackendInput<'_>,
) -> Result<BackendCall, VideoGenError> {
    Ok(BackendCall::Positional {
        endpoint: descriptor.endpoint()?,
        args: vec![required_image(descriptor, input)?],
    })
}

/// `(image, prompt)`
pub fn image_and_prompt(
    descriptor: &ModelDescriptor,
    input: &BackendInput<'_>,
) -> Result<BackendCall, VideoGenError> {
    Ok(BackendCall::Positional {
        endpoint: descriptor.endpoint()?,
        args: vec![
            required_image(descriptor, input)?,
            CallArg::Text(input.prompt.to_string()),
        ],
    })
}

/// `{"prompt": prompt}`
pub fn named_prompt(
    descriptor: &ModelDescriptor,
    input: &BackendInput<'_>,
) -> Result<BackendCall, VideoGenError> {
    let mut named = Map::new();
    named.insert("prompt".to_string(), Value::String(input.prompt.to_string()));
    Ok(BackendCall::Named {
        endpoint: descriptor.endpoint()?,
        input: named,
    })
}

/// Prompt plus the descriptor's sampling presets.
pub fn pipeline_call(
    descriptor: &ModelDescriptor,
    input: &BackendInput<'_>,
) -> Result<BackendCall, VideoGenError> {
    let params = &descriptor.params;
    Ok(BackendCall::Pipeline {
        prompt: input.prompt.to_string(),
        frame_count: params.frame_count,
        inference_steps: params.inference_steps.unwrap_or(50),
        guidance_scale: params.guidance_scale.unwrap_or(6.0),
        fps: params.fps.unwrap_or(global_constants::LOCAL_VIDEO_FPS),
    })
}

pub fn no_backend_call(
    descriptor: &ModelDescriptor,
    _input: &BackendInput<'_>,
) -> Result<BackendCall, VideoGenError> {
    Err(VideoGenError::Internal(format!(
        "model {} is served without a backend",
        descriptor.id
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(prompt: &str) -> BackendInput<'_> {
        BackendInput {
            prompt,
            image: None,
        }
    }

    #[test]
    fn zeroscope_takes_frames_and_resolution() {
        let call = ZEROSCOPE_MODEL.request_for(&text("a cat")).unwrap();
        assert_eq!(
            call,
            BackendCall::Positional {
                endpoint: "/predict".into(),
                args: vec![
                    CallArg::Text("a cat".into()),
                    CallArg::Integer(8),
                    CallArg::Integer(512),
                    CallArg::Integer(320),
                ],
            }
        );
    }

    #[test]
    fn cogvideox_takes_prompt_only() {
        let call = COGVIDEOX_5B_MODEL.request_for(&text("a cat")).unwrap();
        assert_eq!(
            call,
            BackendCall::Positional {
                endpoint: "/infer".into(),
                args: vec![CallArg::Text("a cat".into())],
            }
        );
    }

    #[test]
    fn stable_video_diffusion_takes_image_only() {
        let path = Path::new("/tmp/input.png");
        let call = STABLE_VIDEO_DIFFUSION_MODEL
            .request_for(&BackendInput {
                prompt: "ignored",
                image: Some(path),
            })
            .unwrap();
        assert_eq!(
            call,
            BackendCall::Positional {
                endpoint: "/generate_video".into(),
                args: vec![CallArg::File(path.to_path_buf())],
            }
        );

        assert!(matches!(
            STABLE_VIDEO_DIFFUSION_MODEL.request_for(&text("no image")),
            Err(VideoGenError::Internal(_))
        ));
    }

    #[test]
    fn replicate_models_take_named_prompt() {
        let call = REPLICATE_HAILUO_MODEL.request_for(&text("a cat")).unwrap();
        let BackendCall::Named { endpoint, input } = call else {
            panic!("expected a named call");
        };
        assert_eq!(endpoint, "minimax/video-01");
        assert_eq!(input.get("prompt"), Some(&Value::String("a cat".into())));
    }

    #[test]
    fn local_pipeline_uses_presets() {
        let call = COGVIDEOX_2B_LOCAL_MODEL.request_for(&text("a cat")).unwrap();
        assert_eq!(
            call,
            BackendCall::Pipeline {
                prompt: "a cat".into(),
                frame_count: 49,
                inference_steps: 50,
                guidance_scale: 6.0,
                fps: 8,
            }
        );
    }

    #[test]
    fn demo_supports_both_operations() {
        assert!(DEMO_MODEL.supports(GenerationType::TextToVideo));
        assert!(DEMO_MODEL.supports(GenerationType::ImageToVideo));
        assert!(!COGVIDEOX_5B_MODEL.supports(GenerationType::ImageToVideo));
        assert!(DEMO_MODEL.request_for(&text("a cat")).is_err());
    }
}
