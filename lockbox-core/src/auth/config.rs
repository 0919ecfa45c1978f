//! Immutable session configuration.

use crate::crypto::HashingParams;
use crate::{LockboxError, Result};
use std::fmt;
use std::time::Duration;
use zeroize::Zeroizing;

/// Default access token lifetime: 15 minutes.
pub const DEFAULT_ACCESS_TTL: Duration = Duration::from_secs(15 * 60);

/// Default refresh token lifetime: 7 days.
pub const DEFAULT_REFRESH_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Longest accepted token lifetime: 10 years.
pub const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Signing secret, token lifetimes and hashing cost, fixed at startup.
#[derive(Clone)]
pub struct SessionConfig {
    secret: Zeroizing<Vec<u8>>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    hashing: HashingParams,
}

impl SessionConfig {
    /// Config with default lifetimes and hashing cost.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self> {
        Self::with_ttls(secret, DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL)
    }

    pub fn with_ttls(
        secret: impl Into<Vec<u8>>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self> {
        let secret = Zeroizing::new(secret.into());
        if secret.is_empty() {
            return Err(LockboxError::Validation(
                "token secret must not be empty".to_string(),
            ));
        }
        if access_ttl.as_secs() == 0 || refresh_ttl.as_secs() == 0 {
            return Err(LockboxError::Validation(
                "token lifetimes must be at least one second".to_string(),
            ));
        }
        if access_ttl > MAX_TTL || refresh_ttl > MAX_TTL {
            return Err(LockboxError::Validation(format!(
                "token lifetimes must not exceed {}s",
                MAX_TTL.as_secs()
            )));
        }
        if access_ttl > refresh_ttl {
            return Err(LockboxError::Validation(format!(
                "access token lifetime ({}s) exceeds refresh token lifetime ({}s)",
                access_ttl.as_secs(),
                refresh_ttl.as_secs()
            )));
        }

        Ok(Self {
            secret,
            access_ttl,
            refresh_ttl,
            hashing: HashingParams::default(),
        })
    }

    pub fn with_hashing(mut self, hashing: HashingParams) -> Self {
        self.hashing = hashing;
        self
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn hashing(&self) -> HashingParams {
        self.hashing
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("hashing", &self.hashing)
            .finish()
    }
}
