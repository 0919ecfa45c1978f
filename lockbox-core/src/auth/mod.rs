//! Session authority: registration, login and stateless token rotation.

mod config;
mod gate;

pub use config::{SessionConfig, DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL, MAX_TTL};
pub use gate::{bearer_token, AuthorizationGate, TokenValidator};

use crate::crypto::{Claims, CredentialHasher, TokenKind, TokenSigner};
use crate::models::UserId;
use crate::store::UserStore;
use crate::{LockboxError, Result};
use chrono::Utc;

/// Freshly issued access/refresh pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Remaining lifetime of the access token.
    pub expires_in_seconds: i64,
}

/// Issues, validates and rotates session tokens for users of one credential store.
pub struct SessionAuthority<U> {
    users: U,
    signer: TokenSigner,
    hasher: CredentialHasher,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    /// Verified against when the login is unknown, so that path costs the same.
    dummy_hash: String,
}

impl<U: UserStore> SessionAuthority<U> {
    pub fn new(users: U, config: SessionConfig) -> Result<Self> {
        let hasher = CredentialHasher::new(config.hashing())?;
        let dummy_hash = hasher.hash("lockbox-timing-equalizer")?;

        Ok(Self {
            users,
            signer: TokenSigner::new(config.secret()),
            hasher,
            access_ttl_secs: ttl_secs(config.access_ttl())?,
            refresh_ttl_secs: ttl_secs(config.refresh_ttl())?,
            dummy_hash,
        })
    }

    pub fn users(&self) -> &U {
        &self.users
    }

    /// Create a user and return its identifier.
    pub fn register(&self, login: &str, password: &str) -> Result<UserId> {
        require("login", login)?;
        require("password", password)?;

        let hash = self.hasher.hash(password)?;
        let user = self.users.create_user(login, &hash)?;

        tracing::info!("Registered user {}", user.id);
        Ok(user.id)
    }

    /// Verify credentials and issue a fresh token pair.
    pub fn login(&self, login: &str, password: &str) -> Result<TokenPair> {
        require("login", login)?;
        require("password", password)?;

        let user = self.users.find_by_login(login)?;
        let stored_hash = user
            .as_ref()
            .map(|u| u.password_hash.as_str())
            .unwrap_or(self.dummy_hash.as_str());
        let matches = self.hasher.verify(password, stored_hash)?;

        match user {
            Some(user) if matches => {
                tracing::debug!("User {} logged in", user.id);
                self.issue(&user.id)
            }
            _ => {
                tracing::warn!("Failed login attempt");
                Err(LockboxError::InvalidCredentials)
            }
        }
    }

    /// Exchange a valid refresh token for a brand-new pair.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        require("refresh token", refresh_token)?;

        let claims = self.verify_kind(refresh_token, TokenKind::Refresh)?;
        let subject = UserId::new(claims.sub);
        if self.users.find_by_id(&subject)?.is_none() {
            tracing::warn!("Refresh token for unknown user {}", subject);
            return Err(LockboxError::InvalidToken);
        }

        self.issue(&subject)
    }

    /// Resolve an access token to its subject.
    pub fn validate_token(&self, token: &str) -> Result<UserId> {
        let claims = self.verify_kind(token, TokenKind::Access)?;
        Ok(UserId::new(claims.sub))
    }

    fn verify_kind(&self, token: &str, kind: TokenKind) -> Result<Claims> {
        let claims = self.signer.verify(token)?;
        if claims.typ != kind {
            tracing::debug!("expected {:?} token, got {:?}", kind, claims.typ);
            return Err(LockboxError::InvalidToken);
        }
        Ok(claims)
    }

    fn issue(&self, subject: &UserId) -> Result<TokenPair> {
        self.issue_at(subject, Utc::now().timestamp())
    }

    fn issue_at(&self, subject: &UserId, issued_at: i64) -> Result<TokenPair> {
        let access = Claims::new(
            subject.as_str(),
            TokenKind::Access,
            issued_at,
            self.access_ttl_secs,
        );
        let refresh = Claims::new(
            subject.as_str(),
            TokenKind::Refresh,
            issued_at,
            self.refresh_ttl_secs,
        );

        Ok(TokenPair {
            access_token: self.signer.sign(&access)?,
            refresh_token: self.signer.sign(&refresh)?,
            expires_in_seconds: (access.exp - Utc::now().timestamp()).max(0),
        })
    }
}

impl<U: UserStore> TokenValidator for SessionAuthority<U> {
    fn validate_token(&self, token: &str) -> Result<UserId> {
        SessionAuthority::validate_token(self, token)
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(LockboxError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

fn ttl_secs(ttl: std::time::Duration) -> Result<i64> {
    i64::try_from(ttl.as_secs())
        .map_err(|_| LockboxError::Validation(format!("token lifetime {:?} out of range", ttl)))
}
