use std::sync::LazyLock;

use global_constants::{DEMO_MODEL_ID, TEST_MODEL_ID};

use super::{no_backend_call, BackendRef, GenerationParams, ModelDescriptor};
use crate::types::GenerationType;

pub static DEMO_MODEL: LazyLock<ModelDescriptor> = LazyLock::new(|| ModelDescriptor {
    id: DEMO_MODEL_ID.to_string(),
    name: "Demo Mode (Test Video)".to_string(),
    description: "Demo mode - returns sample video for testing UI".to_string(),
    generation_type: GenerationType::TextToVideo,
    backend: BackendRef::Demo,
    params: GenerationParams {
        width: 1920,
        height: 1080,
        ..Default::default()
    },
    features: &["demo", "instant"],
    duration: Some("varies".to_string()),
    is_internal: false,
    build_request: no_backend_call,
});

pub static TEST_MODEL: LazyLock<ModelDescriptor> = LazyLock::new(|| ModelDescriptor {
    id: TEST_MODEL_ID.to_string(),
    name: "Test Mode (Demo Video)".to_string(),
    description: "Internal test model that always returns the same video".to_string(),
    is_internal: true,
    ..DEMO_MODEL.clone()
});
