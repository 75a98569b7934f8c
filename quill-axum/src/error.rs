use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quill_core::errors::QuillError;

#[derive(Debug)]
pub struct QuillAxumError(pub anyhow::Error);

impl From<anyhow::Error> for QuillAxumError {
    fn from(e: anyhow::Error) -> Self {
        Self(e)
    }
}

impl From<QuillError> for QuillAxumError {
    fn from(e: QuillError) -> Self {
        Self(e.into_anyhow())
    }
}

impl IntoResponse for QuillAxumError {
    fn into_response(self) -> Response {
        let safe = match QuillError::from_anyhow(&self.0) {
            Some(quill) => quill.sanitize_for_client(),
            None => QuillError::general_error(self.0.to_string()),
        };

        let status = StatusCode::from_u16(safe.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self.0, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %safe, "request rejected");
        }

        (status, Json(safe.to_json())).into_response()
    }
}
