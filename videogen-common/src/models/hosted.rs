use std::sync::LazyLock;

use super::{
    image_only, prompt_only, prompt_with_dimensions, BackendRef, GenerationParams,
    ModelDescriptor,
};
use crate::types::GenerationType;

fn hosted(space: &str, api_name: &str) -> BackendRef {
    BackendRef::HostedSpace {
        space: space.to_string(),
        api_name: api_name.to_string(),
    }
}

pub static ZEROSCOPE_MODEL: LazyLock<ModelDescriptor> = LazyLock::new(|| ModelDescriptor {
    id: "zeroscope".to_string(),
    name: "Zeroscope v2 XL".to_string(),
    description: "Short, low resolution text-to-video clips".to_string(),
    generation_type: GenerationType::TextToVideo,
    backend: hosted("https://cerspense-zeroscope-v2-xl.hf.space", "/predict"),
    params: GenerationParams {
        frame_count: 8,
        width: 512,
        height: 320,
        ..Default::default()
    },
    features: &["fast", "short_videos"],
    duration: None,
    is_internal: false,
    build_request: prompt_with_dimensions,
});

pub static COGVIDEOX_5B_MODEL: LazyLock<ModelDescriptor> = LazyLock::new(|| ModelDescriptor {
    id: "cogvideox-5b".to_string(),
    name: "CogVideoX-5B (THUDM)".to_string(),
    description: "High-quality text-to-video generation (6 seconds, 720p)".to_string(),
    generation_type: GenerationType::TextToVideo,
    backend: hosted("THUDM/CogVideoX-5B-Space", "/infer"),
    params: GenerationParams {
        frame_count: 49,
        width: 720,
        height: 480,
        guidance_scale: Some(6.0),
        inference_steps: Some(50),
        ..Default::default()
    },
    features: &["high_quality", "longer_videos"],
    duration: None,
    is_internal: false,
    build_request: prompt_only,
});

pub static COGVIDEOX_2B_MODEL: LazyLock<ModelDescriptor> = LazyLock::new(|| ModelDescriptor {
    id: "cogvideox-2b".to_string(),
    name: "CogVideoX-2B (Faster)".to_string(),
    description: "Faster version of CogVideoX with good quality".to_string(),
    generation_type: GenerationType::TextToVideo,
    backend: hosted("THUDM/CogVideoX-2B-Space", "/infer"),
    params: GenerationParams {
        frame_count: 49,
        width: 720,
        height: 480,
        guidance_scale: Some(6.0),
        inference_steps: Some(30),
        ..Default::default()
    },
    features: &["fast", "good_quality"],
    duration: None,
    is_internal: false,
    build_request: prompt_only,
});

pub static HUNYUAN_VIDEO_MODEL: LazyLock<ModelDescriptor> = LazyLock::new(|| ModelDescriptor {
    id: "hunyuan-video".to_string(),
    name: "HunyuanVideo (Tencent)".to_string(),
    description: "State-of-the-art video generation by Tencent (may be slow/unavailable)"
        .to_string(),
    generation_type: GenerationType::TextToVideo,
    backend: hosted("tencent/HunyuanVideo", "/generate"),
    params: GenerationParams {
        frame_count: 129,
        width: 1280,
        height: 720,
        inference_steps: Some(50),
        ..Default::default()
    },
    features: &["sota", "high_quality"],
    duration: None,
    is_internal: false,
    build_request: prompt_only,
});

pub static STABLE_VIDEO_DIFFUSION_MODEL: LazyLock<ModelDescriptor> =
    LazyLock::new(|| ModelDescriptor {
        id: "stable-video-diffusion".to_string(),
        name: "Stable Video Diffusion".to_string(),
        description: "Image-to-video animation (14-25 frames)".to_string(),
        generation_type: GenerationType::ImageToVideo,
        backend: hosted("multimodalart/stable-video-diffusion", "/generate_video"),
        params: GenerationParams {
            frame_count: 14,
            width: 576,
            height: 576,
            fps: Some(7),
            ..Default::default()
        },
        features: &["image_animation", "stable"],
        duration: None,
        is_internal: false,
        build_request: image_only,
    });

/// Zeroscope pointed at a different space, for single-space deployments.
pub fn zeroscope_at(space: &str) -> ModelDescriptor {
    ModelDescriptor {
        backend: hosted(space, "/predict"),
        ..ZEROSCOPE_MODEL.clone()
    }
}
