use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

/// Request-path failures. Every variant renders as `{"error": ...}` with a
/// status code, so handlers can bubble these up with `?`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("generation unavailable: {message}")]
    GenerationUnavailable { message: String, timed_out: bool },
    #[error("malformed upstream response: {0}")]
    Malformed(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn unavailable<E: std::fmt::Display>(err: E) -> Self {
        ApiError::GenerationUnavailable {
            message: err.to_string(),
            timed_out: false,
        }
    }

    pub fn malformed<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Malformed(err.to_string())
    }

    /// Classifies a reqwest failure. Timeouts are kept apart so callers can
    /// tell a slow upstream from a broken one.
    pub fn from_upstream(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return ApiError::Malformed(err.to_string());
        }
        ApiError::GenerationUnavailable {
            timed_out: err.is_timeout(),
            message: err.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::GenerationUnavailable { timed_out: true, .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::GenerationUnavailable { .. } | ApiError::Malformed(_) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let message = match &self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => msg.clone(),
            ApiError::GenerationUnavailable { timed_out: true, .. } => {
                "Generation model timed out".to_string()
            }
            ApiError::GenerationUnavailable { message, .. } => {
                format!("Generation model unavailable: {}", message)
            }
            ApiError::Malformed(msg) => format!("Malformed response from generation model: {}", msg),
            ApiError::Internal(msg) => msg.clone(),
        };

        let body = Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
