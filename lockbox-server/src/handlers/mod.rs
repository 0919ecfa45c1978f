//! Request handlers.

pub mod auth;
pub mod records;

use crate::error::ApiError;
use lockbox_core::LockboxError;

/// Run CPU-heavy work (password hashing) off the async workers.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> lockbox_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError(LockboxError::Internal(format!("worker failed: {}", e))))?
        .map_err(ApiError::from)
}
