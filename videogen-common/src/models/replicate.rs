use std::sync::LazyLock;

use super::{named_prompt, BackendRef, GenerationParams, ModelDescriptor};
use crate::types::GenerationType;

fn replicate_model(
    id: &str,
    name: &str,
    description: &str,
    model: &str,
    duration: &str,
) -> ModelDescriptor {
    ModelDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        generation_type: GenerationType::TextToVideo,
        backend: BackendRef::Replicate {
            model: model.to_string(),
        },
        params: GenerationParams::default(),
        features: &["paid"],
        duration: Some(duration.to_string()),
        is_internal: false,
        build_request: named_prompt,
    }
}

pub static REPLICATE_HAILUO_MODEL: LazyLock<ModelDescriptor> = LazyLock::new(|| {
    replicate_model(
        "hailuo",
        "Hailuo Video-01 (MiniMax) - 6s",
        "High quality text-to-video, 6 seconds",
        "minimax/video-01",
        "6s",
    )
});

pub static REPLICATE_COGVIDEOX_MODEL: LazyLock<ModelDescriptor> = LazyLock::new(|| {
    replicate_model(
        "cogvideox",
        "CogVideoX-5B - 6s",
        "High quality text-to-video, 6 seconds",
        "lucataco/cogvideox-5b",
        "6s",
    )
});

pub static REPLICATE_HUNYUAN_MODEL: LazyLock<ModelDescriptor> = LazyLock::new(|| {
    replicate_model(
        "hunyuan",
        "HunyuanVideo (Tencent) - 5s+",
        "State-of-the-art by Tencent, 5+ seconds",
        "tencent/hunyuan-video",
        "5s+",
    )
});

pub static REPLICATE_LUMA_MODEL: LazyLock<ModelDescriptor> = LazyLock::new(|| {
    replicate_model(
        "luma",
        "Luma Dream Machine - 5s",
        "Cinematic quality, 5 seconds",
        "fofr/dream-machine",
        "5s",
    )
});

pub static REPLICATE_RUNWAY_MODEL: LazyLock<ModelDescriptor> = LazyLock::new(|| {
    replicate_model(
        "runway",
        "Runway Gen-3 - 10s",
        "Professional quality, up to 10 seconds",
        "stability-ai/stable-video-diffusion-img2vid-xt",
        "10s",
    )
});
