//! Extractors whose rejections use the JSON error body.

use crate::error::{error_response, ApiError};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use lockbox_core::LockboxError;
use serde::de::DeserializeOwned;

/// `Json<T>` that reports malformed bodies as `validation_error`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

/// `Query<T>` that reports malformed query strings as `validation_error`.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(query_rejection(rejection)),
        }
    }
}

/// Bodies cut off by the size limit keep their 413 status.
fn json_rejection(rejection: JsonRejection) -> Response {
    let error = LockboxError::Validation(format!(
        "invalid request body: {}",
        rejection.body_text()
    ));
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return error_response(StatusCode::PAYLOAD_TOO_LARGE, error.code(), error.to_string());
    }
    ApiError(error).into_response()
}

fn query_rejection(rejection: QueryRejection) -> ApiError {
    ApiError(LockboxError::Validation(format!(
        "invalid query: {}",
        rejection.body_text()
    )))
}
