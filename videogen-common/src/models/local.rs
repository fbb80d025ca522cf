use std::sync::LazyLock;

use global_constants::LOCAL_VIDEO_FPS;

use super::{pipeline_call, BackendRef, GenerationParams, ModelDescriptor};
use crate::types::GenerationType;

// ~6 seconds at 8 fps
pub static COGVIDEOX_2B_LOCAL_MODEL: LazyLock<ModelDescriptor> =
    LazyLock::new(|| ModelDescriptor {
        id: "cogvideox-2b-local".to_string(),
        name: "CogVideoX-2B (Local)".to_string(),
        description: "Running locally on your computer".to_string(),
        generation_type: GenerationType::TextToVideo,
        backend: BackendRef::LocalPipeline {
            checkpoint: "THUDM/CogVideoX-2b".to_string(),
        },
        params: GenerationParams {
            frame_count: 49,
            width: 720,
            height: 480,
            guidance_scale: Some(6.0),
            inference_steps: Some(50),
            fps: Some(LOCAL_VIDEO_FPS),
        },
        features: &["local", "private"],
        duration: Some("6s".to_string()),
        is_internal: false,
        build_request: pipeline_call,
    });
