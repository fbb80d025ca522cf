pub mod adapter_registry;
pub mod backends;
pub mod catalog;
#[cfg(feature = "client")]
pub mod client;
pub mod dispatcher;
pub mod image_input;
pub mod model_registry;
pub mod models;
pub mod prompt;
pub mod types;

pub use adapter_registry::AdapterRegistry;
pub use backends::{BackendAdapter, BackendHandle, BackendSettings};
#[cfg(feature = "client")]
pub use client::VideoGenClient;
pub use dispatcher::Dispatcher;
pub use model_registry::{ModelRegistry, Profile};
pub use models::{BackendCall, BackendKind, BackendRef, ModelDescriptor};
pub use prompt::{build_enhanced_prompt, PromptLimits};
pub use types::{
    ErrorResponse, GenerationRequest, GenerationResult, GenerationType, HealthResponse,
    ImageGenerationRequest, InitializeResponse, ModelsResponse, TestVideoRequest, VideoGenError,
};
