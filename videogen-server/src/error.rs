use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use videogen_common::{ErrorResponse, VideoGenError};

/// Turns a [`VideoGenError`] into `{"error": ...}` with its status code.
/// Backend detail is logged here and never sent to the caller.
#[derive(Debug)]
pub struct ApiError(pub VideoGenError);

impl From<VideoGenError> for ApiError {
    fn from(e: VideoGenError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if self.0.is_client_error() {
            tracing::warn!(status = status.as_u16(), error = %self.0, "request rejected");
        } else {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        }
        error_response(status, self.0.public_message())
    }
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}
