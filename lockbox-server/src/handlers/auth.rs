//! Register, login and refresh handlers. None of these require a bearer token.

use super::blocking;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::server::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use lockbox_core::api::{
    LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse, TokenResponse,
};

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let authority = state.authority.clone();
    let user_id = blocking(move || authority.register(&req.login, &req.password)).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "user registered".to_string(),
            user_id: user_id.to_string(),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let authority = state.authority.clone();
    let pair = blocking(move || authority.login(&req.login, &req.password)).await?;
    Ok(Json(TokenResponse::new("logged in", pair)))
}

pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let pair = state.authority.refresh(&req.refresh_token)?;
    Ok(Json(TokenResponse::new("tokens refreshed", pair)))
}
