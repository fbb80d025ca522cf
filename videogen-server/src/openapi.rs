use utoipa::OpenApi;
use videogen_common::types::{EnhancementOption, ModelSummary};
use videogen_common::{
    ErrorResponse, GenerationRequest, GenerationResult, GenerationType, HealthResponse,
    ImageGenerationRequest, InitializeResponse, ModelsResponse, TestVideoRequest, VideoGenError,
};

use crate::routes;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Video Generation API",
        description = "Text-to-video and image-to-video generation over hosted, paid and local backends"
    ),
    paths(
        routes::health,
        routes::models,
        routes::generate_video,
        routes::generate_video_from_image,
        routes::test_video,
        routes::initialize,
        routes::download,
    ),
    components(schemas(
        GenerationRequest,
        ImageGenerationRequest,
        TestVideoRequest,
        GenerationResult,
        GenerationType,
        ModelSummary,
        EnhancementOption,
        ModelsResponse,
        HealthResponse,
        InitializeResponse,
        ErrorResponse,
        VideoGenError,
    ))
)]
pub struct ApiDoc;
