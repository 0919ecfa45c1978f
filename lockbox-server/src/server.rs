//! Axum router setup.

use crate::auth::auth_middleware;
use crate::config::ServerConfig;
use crate::error::{error_response, json_errors};
use crate::handlers::{auth, records};
use axum::http::{Method, StatusCode, Uri};
use axum::middleware;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use lockbox_core::{
    AuthorizationGate, LockboxError, SessionAuthority, SessionConfig, SqliteStore, SyncEngine,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub type Authority = SessionAuthority<SqliteStore>;
pub type Engine = SyncEngine<SqliteStore>;
pub type Gate = AuthorizationGate<Arc<Authority>>;

/// Shared handler state. Built once at startup, read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub authority: Arc<Authority>,
    pub engine: Arc<Engine>,
    pub gate: Arc<Gate>,
}

impl AppState {
    pub fn new(store: SqliteStore, session: SessionConfig) -> lockbox_core::Result<Self> {
        let authority = Arc::new(SessionAuthority::new(store.clone(), session)?);
        Ok(Self {
            gate: Arc::new(AuthorizationGate::new(authority.clone())),
            engine: Arc::new(SyncEngine::new(store)),
            authority,
        })
    }
}

pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    // Authenticated routes
    let authenticated = Router::new()
        .route(
            "/api/v1/records",
            post(records::save_record).get(records::list_records),
        )
        .route(
            "/api/v1/records/{id}",
            get(records::get_record).delete(records::delete_record),
        )
        .route(
            "/api/v1/records/",
            get(records::missing_id).delete(records::missing_id),
        )
        .route("/api/v1/sync", post(records::sync_records))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Unauthenticated routes
    let public = Router::new()
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/health", get(health));

    Router::new()
        .merge(authenticated)
        .merge(public)
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(config.max_payload_size))
        .layer(middleware::map_response(json_errors))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn not_found(method: Method, uri: Uri) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        LockboxError::NotFound.code(),
        format!("no route for {} {}", method, uri.path()),
    )
}
