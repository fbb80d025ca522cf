use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::{Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use videogen_common::{
    Dispatcher, ErrorResponse, GenerationRequest, GenerationResult, HealthResponse,
    ImageGenerationRequest, InitializeResponse, ModelsResponse, TestVideoRequest, VideoGenError,
};

use crate::error::{error_response, ApiError};
use crate::openapi::ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/models", get(models))
        .route("/generate-video", post(generate_video))
        .route("/generate-video-from-image", post(generate_video_from_image))
        .route("/test-video", post(test_video))
        .route("/initialize", post(initialize))
        .route("/download/{filename}", get(download))
        .route("/api-docs/openapi.json", get(openapi_json))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Rejects bodies declared as something other than JSON. A missing
/// content type is left to the body parser.
fn require_json(headers: &HeaderMap) -> Result<(), ApiError> {
    match headers.get(CONTENT_TYPE).map(|v| v.to_str()) {
        Some(Ok(ct)) if ct.to_ascii_lowercase().contains("json") => Ok(()),
        None => Ok(()),
        Some(_) => Err(VideoGenError::BadRequest("Request must be JSON".to_string()).into()),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service status", body = HealthResponse))
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.dispatcher.health())
}

#[utoipa::path(
    get,
    path = "/models",
    responses(
        (status = 200, description = "Models and prompt enhancement options", body = ModelsResponse)
    )
)]
pub async fn models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(state.dispatcher.models())
}

#[utoipa::path(
    post,
    path = "/generate-video",
    request_body = GenerationRequest,
    responses(
        (status = 200, description = "Video generated", body = GenerationResult),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse),
        (status = 503, description = "Backend unavailable", body = ErrorResponse),
        (status = 504, description = "Backend timed out", body = ErrorResponse),
    )
)]
pub async fn generate_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GenerationResult>, ApiError> {
    require_json(&headers)?;
    Ok(Json(state.dispatcher.generate_video(&body).await?))
}

#[utoipa::path(
    post,
    path = "/generate-video-from-image",
    request_body = ImageGenerationRequest,
    responses(
        (status = 200, description = "Video generated", body = GenerationResult),
        (status = 400, description = "Invalid request or image", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse),
        (status = 503, description = "Backend unavailable", body = ErrorResponse),
        (status = 504, description = "Backend timed out", body = ErrorResponse),
    )
)]
pub async fn generate_video_from_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GenerationResult>, ApiError> {
    require_json(&headers)?;
    Ok(Json(state.dispatcher.generate_video_from_image(&body).await?))
}

#[utoipa::path(
    post,
    path = "/test-video",
    request_body(content = TestVideoRequest, description = "Optional"),
    responses(
        (status = 200, description = "Sample video", body = GenerationResult),
        (status = 400, description = "Invalid request", body = ErrorResponse),
    )
)]
pub async fn test_video(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<GenerationResult>, ApiError> {
    if !body.is_empty() {
        require_json(&headers)?;
    }
    Ok(Json(state.dispatcher.test_video(&body)?))
}

#[utoipa::path(
    post,
    path = "/initialize",
    responses(
        (status = 200, description = "Default model backend connected", body = InitializeResponse),
        (status = 503, description = "Backend unavailable", body = ErrorResponse),
    )
)]
pub async fn initialize(
    State(state): State<AppState>,
) -> Result<Json<InitializeResponse>, ApiError> {
    Ok(Json(state.dispatcher.initialize_default().await?))
}

#[utoipa::path(
    get,
    path = "/download/{filename}",
    params(("filename" = String, Path, description = "Generated video file name")),
    responses(
        (status = 200, description = "Video file (video/mp4)"),
        (status = 404, description = "No such video", body = ErrorResponse),
    )
)]
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    request: Request,
) -> Result<Response, ApiError> {
    let path = state.dispatcher.resolve_download(&filename).await?;
    // Content type comes from the `.mp4` extension; range requests are honoured.
    let response = match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    Ok(response.map(Body::new))
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use videogen_common::backends::{BackendAdapter, BackendHandle};
    use videogen_common::{
        AdapterRegistry, BackendCall, BackendKind, ModelDescriptor, ModelRegistry, Profile,
    };

    use super::*;

    struct StubHandle;

    #[async_trait]
    impl BackendHandle for StubHandle {
        async fn generate(&self, _call: BackendCall) -> Result<Value, VideoGenError> {
            Ok(json!([{ "video": "https://cdn.example.com/out.mp4" }]))
        }
    }

    struct StubAdapter {
        inits: Arc<AtomicUsize>,
        available: bool,
    }

    #[async_trait]
    impl BackendAdapter for StubAdapter {
        fn kind(&self) -> BackendKind {
            BackendKind::HostedSpace
        }

        async fn initialize(
            &self,
            _model: &ModelDescriptor,
        ) -> Result<Arc<dyn BackendHandle>, VideoGenError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            if self.available {
                Ok(Arc::new(StubHandle))
            } else {
                Err(VideoGenError::ServiceUnavailable(
                    "connect error: tcp 10.0.0.7:443".into(),
                ))
            }
        }
    }

    fn app_with(available: bool) -> (Router, Arc<AtomicUsize>) {
        let inits = Arc::new(AtomicUsize::new(0));
        let adapter: Arc<dyn BackendAdapter> = Arc::new(StubAdapter {
            inits: inits.clone(),
            available,
        });
        let dispatcher = Dispatcher::new(
            Profile::Hosted,
            ModelRegistry::for_profile(Profile::Hosted),
            AdapterRegistry::new([adapter]),
        );
        let app = router(AppState {
            dispatcher: Arc::new(dispatcher),
        });
        (app, inits)
    }

    fn app() -> Router {
        app_with(true).0
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    #[tokio::test]
    async fn health_reports_profile_and_models() {
        let (status, body) = send(app(), get_req("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["profile"], "hosted");
        assert_eq!(body["default_model"], "cogvideox-5b");
        assert_eq!(body["client_initialized"], false);
        assert!(body.get("model_loaded").is_none());
    }

    #[tokio::test]
    async fn models_lists_public_models_and_catalog() {
        let (status, body) = send(app(), get_req("/models")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["default_model"], "cogvideox-5b");
        assert_eq!(body["models"]["zeroscope"]["type"], "text-to-video");
        assert!(body["models"].get("test").is_none());
        assert_eq!(body["camera_movements"].as_array().unwrap().len(), 12);
    }

    #[tokio::test]
    async fn generate_video_returns_result() {
        let (status, body) = send(
            app(),
            post_json(
                "/generate-video",
                json!({ "prompt": "a paper boat in rain", "visual_effect": "film grain" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["video_url"], "https://cdn.example.com/out.mp4");
        assert_eq!(body["prompt"], "a paper boat in rain");
        assert_eq!(body["enhanced_prompt"], "a paper boat in rain, film grain");
        assert_eq!(body["model"], "cogvideox-5b");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn validation_errors_are_400_with_message() {
        let (status, body) = send(
            app(),
            post_json("/generate-video", json!({ "prompt": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Prompt must be at least 3 characters long" }));

        let (status, body) = send(
            app(),
            post_json("/generate-video", json!({ "prompt": "a red fox", "model": "nope" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid model: nope");
    }

    #[tokio::test]
    async fn non_json_body_is_rejected() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/generate-video")
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::from("prompt=a red fox"))
            .unwrap();
        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Request must be JSON");
    }

    #[tokio::test]
    async fn unavailable_backend_is_503_without_detail() {
        let (app, inits) = app_with(false);
        for _ in 0..2 {
            let (status, body) = send(
                app.clone(),
                post_json("/generate-video", json!({ "prompt": "a red fox" })),
            )
            .await;
            assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            assert!(!body["error"].as_str().unwrap().contains("10.0.0.7"));
        }
        assert_eq!(inits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn demo_model_skips_backend() {
        let (app, inits) = app_with(false);
        let (status, body) = send(
            app,
            post_json("/generate-video", json!({ "prompt": "a red fox", "model": "demo" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["video_url"], global_constants::DEMO_VIDEO_URL);
        assert!(body["note"].is_string());
        assert_eq!(inits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_image_is_400() {
        let (status, body) = send(
            app(),
            post_json(
                "/generate-video-from-image",
                json!({ "prompt": "make it move", "image": "data:image/png;base64,xyz" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid image data");
    }

    #[tokio::test]
    async fn test_video_accepts_empty_body() {
        let (app, inits) = app_with(true);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/test-video")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["prompt"], "Test prompt");
        assert_eq!(body["model"], "test-mode");
        assert_eq!(inits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn initialize_connects_default_model() {
        let (app, inits) = app_with(true);
        let request = Request::builder()
            .method(Method::POST)
            .uri("/initialize")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(inits.load(Ordering::SeqCst), 1);

        let (_, body) = send(app, get_req("/health")).await;
        assert_eq!(body["client_initialized"], true);
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let (status, body) = send(app(), get_req("/generate")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn wrong_method_is_json_405() {
        let (status, body) = send(app(), get_req("/generate-video")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({ "error": "Method not allowed" }));
    }

    #[tokio::test]
    async fn download_serves_files_from_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"not really an mp4").unwrap();
        let dispatcher = Dispatcher::new(
            Profile::Local,
            ModelRegistry::for_profile(Profile::Local),
            AdapterRegistry::empty(),
        )
        .with_output_dir(dir.path());
        let app = router(AppState {
            dispatcher: Arc::new(dispatcher),
        });

        let response = app
            .clone()
            .oneshot(get_req("/download/clip.mp4"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "video/mp4");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"not really an mp4");

        let ranged = Request::builder()
            .uri("/download/clip.mp4")
            .header("range", "bytes=0-2")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(ranged).await.unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"not");

        let (status, _) = send(app.clone(), get_req("/download/missing.mp4")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(app, get_req("/download/..%2Fsecret.mp4")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid filename");
    }

    #[tokio::test]
    async fn cors_preflight_is_allowed() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/generate-video")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert!(response.status().is_success());
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn openapi_document_lists_routes() {
        let (status, body) = send(app(), get_req("/api-docs/openapi.json")).await;
        assert_eq!(status, StatusCode::OK);
        for path in ["/health", "/models", "/generate-video", "/generate-video-from-image"] {
            assert!(body["paths"].get(path).is_some(), "{path}");
        }
    }
}
