//! HTTP mapping for core errors.

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use lockbox_core::api::ErrorResponse;
use lockbox_core::LockboxError;

/// A core error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub LockboxError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            LockboxError::Validation(_) => StatusCode::BAD_REQUEST,
            LockboxError::AlreadyExists | LockboxError::Conflict(_) => StatusCode::CONFLICT,
            LockboxError::InvalidCredentials
            | LockboxError::InvalidToken
            | LockboxError::Unauthenticated => StatusCode::UNAUTHORIZED,
            LockboxError::NotFound => StatusCode::NOT_FOUND,
            LockboxError::Database(_) | LockboxError::Internal(_) | LockboxError::Transport(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<LockboxError> for ApiError {
    fn from(e: LockboxError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.0.is_internal() {
            tracing::error!("Request failed: {}", self.0);
            "internal error".to_string()
        } else {
            self.0.to_string()
        };

        error_response(status, self.0.code(), message)
    }
}

/// The JSON error body with an explicit status.
pub fn error_response(status: StatusCode, code: &str, message: String) -> Response {
    let body = ErrorResponse {
        success: false,
        message,
        code: code.to_string(),
    };
    (status, Json(body)).into_response()
}

/// Rewrites plaintext rejections produced below the handlers (body limit,
/// unmatched method) into the JSON error body. Other headers are kept.
pub async fn json_errors(response: Response) -> Response {
    let status = response.status();
    let message = match status {
        StatusCode::PAYLOAD_TOO_LARGE => "request body exceeds the size limit",
        StatusCode::METHOD_NOT_ALLOWED => "method not allowed for this route",
        _ => return response,
    };
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if is_json {
        return response;
    }

    let body = ErrorResponse {
        success: false,
        message: message.to_string(),
        code: LockboxError::Validation(String::new()).code().to_string(),
    };
    let bytes = match serde_json::to_vec(&body) {
        Ok(bytes) => bytes,
        Err(_) => return response,
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(CONTENT_LENGTH);
    parts
        .headers
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Response::from_parts(parts, Body::from(bytes))
}
