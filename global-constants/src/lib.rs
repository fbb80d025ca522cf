// Prompt bounds
pub const MIN_PROMPT_LENGTH: usize = 3;
pub const MAX_PROMPT_LENGTH: usize = 1000;
pub const BASIC_MAX_PROMPT_LENGTH: usize = 500;

// Reserved model ids that never reach a backend
pub const DEMO_MODEL_ID: &str = "demo";
pub const TEST_MODEL_ID: &str = "test";
pub const TEST_MODE_MODEL_ID: &str = "test-mode";

// Big Buck Bunny, open source sample clip
pub const DEMO_VIDEO_URL: &str =
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";
pub const DEMO_NOTE: &str =
    "Demo mode: This is a sample video. Select a real model for AI generation.";
pub const TEST_MODE_NOTE: &str =
    "This is a demo video. Connect to Hugging Face Spaces for real generation.";
pub const DEFAULT_TEST_PROMPT: &str = "Test prompt";

// Backend calls
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 600;
pub const REPLICATE_POLL_INTERVAL_SECS: u64 = 2;
pub const HF_SPACES_API_BASE: &str = "https://huggingface.co/api/spaces";
pub const REPLICATE_API_BASE: &str = "https://api.replicate.com/v1";

// Local generation
pub const LOCAL_VIDEO_FPS: u32 = 8;
pub const DEFAULT_OUTPUT_DIR: &str = "generated_videos";
pub const DOWNLOAD_ROUTE_PREFIX: &str = "/download/";

pub const DEFAULT_PORT: u16 = 5000;
