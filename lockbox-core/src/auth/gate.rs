//! Authorization gate: turns a bearer credential into a resolved owner.
//!
//! The gate is transport-agnostic. A transport extracts the raw
//! `Authorization` value, hands it to [`AuthorizationGate::authorize`], and
//! threads the returned [`UserId`] into the record operation explicitly.

use crate::models::UserId;
use crate::{LockboxError, Result};
use std::sync::Arc;

/// Anything that can resolve an access token to its subject.
pub trait TokenValidator: Send + Sync {
    fn validate_token(&self, token: &str) -> Result<UserId>;
}

impl<T: TokenValidator + ?Sized> TokenValidator for Arc<T> {
    fn validate_token(&self, token: &str) -> Result<UserId> {
        (**self).validate_token(token)
    }
}

/// Strip an optional `Bearer ` scheme prefix. Empty credentials yield `None`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let header = header.trim();
    let token = match header.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if header.eq_ignore_ascii_case("bearer") => "",
        _ => header,
    };
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Per-call filter in front of every protected operation.
#[derive(Clone)]
pub struct AuthorizationGate<V> {
    validator: V,
}

impl<V: TokenValidator> AuthorizationGate<V> {
    pub fn new(validator: V) -> Self {
        Self { validator }
    }

    /// Resolve the caller from the raw credential.
    ///
    /// Missing and invalid credentials both fail with `Unauthenticated`.
    pub fn authorize(&self, authorization: Option<&str>) -> Result<UserId> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(LockboxError::Unauthenticated)?;

        self.validator.validate_token(token).map_err(|e| {
            tracing::debug!("gate rejected credential: {}", e);
            LockboxError::Unauthenticated
        })
    }
}
