//! Bearer-token middleware in front of the record routes.

use crate::error::ApiError;
use crate::server::AppState;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use lockbox_core::{LockboxError, UserId};

/// Auth middleware: resolves the caller through the gate and stores the
/// owner id in the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let owner = state.gate.authorize(authorization)?;

    request.extensions_mut().insert(owner);
    Ok(next.run(request).await)
}

/// The owner resolved by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct Authenticated(pub UserId);

impl<S: Send + Sync> FromRequestParts<S> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UserId>()
            .cloned()
            .map(Self)
            .ok_or(ApiError(LockboxError::Unauthenticated))
    }
}
