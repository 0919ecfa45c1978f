//! Domain models: users, secret records, save outcomes and sync change sets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque unique user identifier. Every record and token is scoped to one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random identifier for a newly registered user.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered user as held by the credential store.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Unique, case-sensitive.
    pub login: String,
    /// PHC-format Argon2id hash.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Kind of secret a record carries. The payload itself is opaque to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    CredentialPair,
    Text,
    Binary,
    PaymentCard,
}

impl RecordType {
    pub const ALL: [RecordType; 4] = [
        Self::CredentialPair,
        Self::Text,
        Self::Binary,
        Self::PaymentCard,
    ];

    /// Short string stored in the `records.record_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CredentialPair => "credential_pair",
            Self::Text => "text",
            Self::Binary => "binary",
            Self::PaymentCard => "payment_card",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "credential_pair" => Some(Self::CredentialPair),
            "text" => Some(Self::Text),
            "binary" => Some(Self::Binary),
            "payment_card" => Some(Self::PaymentCard),
            _ => None,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One key/value pair of record metadata. Order is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

impl MetadataEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// What a caller submits to save: everything except server-managed fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    /// Caller-assigned identifier; the engine assigns one when absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    pub name: String,
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl RecordDraft {
    pub fn new(
        record_type: RecordType,
        name: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            id: None,
            record_type,
            name: name.into(),
            payload: payload.into(),
            metadata: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push(MetadataEntry::new(key, value));
        self
    }
}

/// A stored secret record.
#[derive(Debug, Clone, PartialEq)]
pub struct SecretRecord {
    /// Unique per owner.
    pub id: String,
    pub owner: UserId,
    pub record_type: RecordType,
    pub name: String,
    pub payload: Vec<u8>,
    pub metadata: Vec<MetadataEntry>,
    /// Starts at 1, +1 on every successful mutation.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SecretRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub id: String,
    pub version: u64,
}

/// Records changed since a cursor, plus the cursor to hand back next time.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    pub records: Vec<SecretRecord>,
    pub cursor: DateTime<Utc>,
}

/// Unix microseconds, the resolution used in storage and on the wire.
pub fn to_micros(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_micros()
}

pub fn from_micros(micros: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_micros(micros)
}

/// Custom base64 serialization for `Vec<u8>`.
pub(crate) mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
