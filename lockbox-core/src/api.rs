//! JSON request/response bodies exchanged between the server and clients.

use crate::auth::TokenPair;
use crate::models::{base64_bytes, to_micros, MetadataEntry, RecordDraft, RecordType, SecretRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(default)]
    pub refresh_token: String,
}

/// Returned by both login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub success: bool,
    pub message: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in_seconds: i64,
}

impl TokenResponse {
    pub fn new(message: &str, pair: TokenPair) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in_seconds: pair.expires_in_seconds,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveRecordRequest {
    #[serde(default)]
    pub record: Option<RecordDraft>,
    /// Version the caller last saw; 0 means "must not exist yet".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRecordResponse {
    pub success: bool,
    pub message: String,
    pub id: String,
    pub version: u64,
}

/// A record as sent to clients. Times are unix microseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordView {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    pub metadata: Vec<MetadataEntry>,
    pub version: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl From<SecretRecord> for RecordView {
    fn from(record: SecretRecord) -> Self {
        Self {
            id: record.id,
            record_type: record.record_type,
            name: record.name,
            payload: record.payload,
            metadata: record.metadata,
            version: record.version,
            created_at: to_micros(record.created_at),
            updated_at: to_micros(record.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetRecordResponse {
    pub success: bool,
    pub message: String,
    pub record: RecordView,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRecordsQuery {
    /// An empty value is the same as leaving the filter out.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub record_type: Option<RecordType>,
}

fn empty_as_none<'de, D>(d: D) -> Result<Option<RecordType>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(d)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(kind) => RecordType::parse(kind).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown record type {:?}", kind))
        }),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRecordsResponse {
    pub success: bool,
    pub message: String,
    pub records: Vec<RecordView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRecordResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncRecordsRequest {
    /// Unix microseconds; 0 requests everything.
    #[serde(default)]
    pub cursor: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRecordsResponse {
    pub success: bool,
    pub message: String,
    pub records: Vec<RecordView>,
    pub new_cursor: i64,
}

/// Body of every failed call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    pub code: String,
}
