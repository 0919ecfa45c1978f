//! Lockbox Core Library
//!
//! Server-side core for storing small typed secrets and keeping several
//! clients in sync:
//! - Session authority: registration, login, token issue and rotation
//! - Authorization gate: bearer-token checks in front of record operations
//! - Record store contracts plus a SQLite adapter
//! - Sync engine: owner-scoped, monotonically versioned records with
//!   timestamp-cursor incremental sync

pub mod api;
pub mod auth;
#[cfg(feature = "client")]
pub mod client;
pub mod crypto;
pub mod models;
pub mod store;
pub mod sync;

pub use auth::{AuthorizationGate, SessionAuthority, SessionConfig, TokenPair, TokenValidator};
pub use models::{
    ChangeSet, MetadataEntry, RecordDraft, RecordType, SaveOutcome, SecretRecord, User, UserId,
};
pub use store::{RecordStore, SqliteStore, UserStore};
pub use sync::SyncEngine;

use thiserror::Error;

/// Result type for Lockbox operations
pub type Result<T> = std::result::Result<T, LockboxError>;

/// Error taxonomy shared by the session authority, the gate and the sync engine.
#[derive(Error, Debug)]
pub enum LockboxError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    Validation(String),

    #[error("user already exists")]
    AlreadyExists,

    /// Unknown login and wrong password are deliberately the same error.
    #[error("invalid login or password")]
    InvalidCredentials,

    #[error("invalid token")]
    InvalidToken,

    #[error("authentication required")]
    Unauthenticated,

    /// Record absent, deleted, or owned by someone else.
    #[error("record not found")]
    NotFound,

    #[error("version conflict: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl LockboxError {
    /// Stable machine-readable code carried on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::AlreadyExists => "already_exists",
            Self::InvalidCredentials => "invalid_credentials",
            Self::InvalidToken => "invalid_token",
            Self::Unauthenticated => "unauthenticated",
            Self::NotFound => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Database(_) | Self::Internal(_) | Self::Transport(_) => "internal",
        }
    }

    /// Rebuild an error from a wire code and message.
    pub fn from_code(code: &str, message: String) -> Self {
        match code {
            "validation_error" => Self::Validation(message),
            "already_exists" => Self::AlreadyExists,
            "invalid_credentials" => Self::InvalidCredentials,
            "invalid_token" => Self::InvalidToken,
            "unauthenticated" => Self::Unauthenticated,
            "not_found" => Self::NotFound,
            "conflict" => Self::Conflict(message),
            _ => Self::Internal(message),
        }
    }

    /// Whether the error hides server-side detail from callers.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Internal(_) | Self::Transport(_))
    }
}
