//! Server configuration.

use lockbox_core::crypto::HashingParams;
use lockbox_core::SessionConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub storage_path: PathBuf,
    pub max_payload_size: usize,
    /// HS256 signing secret; generated at startup when absent.
    pub token_secret: Option<String>,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub deleted_retention_days: u64,
    pub cleanup_interval_secs: u64,
    pub hashing: HashingParams,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:50051".to_string(),
            storage_path: PathBuf::from("lockbox.db"),
            max_payload_size: 1024 * 1024,
            token_secret: None,
            access_token_ttl_secs: 15 * 60,
            refresh_token_ttl_secs: 7 * 24 * 3600,
            deleted_retention_days: 30,
            cleanup_interval_secs: 3600,
            hashing: HashingParams::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Session settings for the given signing secret.
    pub fn session_config(&self, secret: Vec<u8>) -> lockbox_core::Result<SessionConfig> {
        Ok(SessionConfig::with_ttls(
            secret,
            Duration::from_secs(self.access_token_ttl_secs),
            Duration::from_secs(self.refresh_token_ttl_secs),
        )?
        .with_hashing(self.hashing))
    }

    pub fn deleted_retention(&self) -> chrono::Duration {
        i64::try_from(self.deleted_retention_days)
            .ok()
            .and_then(chrono::Duration::try_days)
            .unwrap_or(chrono::Duration::MAX)
    }
}
