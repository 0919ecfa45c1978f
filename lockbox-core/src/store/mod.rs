//! Storage contracts for users and secret records, plus the SQLite backend.
//!
//! The session authority and the sync engine only see these traits. Any
//! backend must provide the guarantees documented on each method; in
//! particular `RecordStore::save_record` is a single atomic
//! read-compare-write.

mod schema;
mod sqlite;

pub use schema::CURRENT_SCHEMA_VERSION;
pub use sqlite::SqliteStore;

use crate::models::{ChangeSet, RecordDraft, RecordType, SaveOutcome, SecretRecord, User, UserId};
use crate::Result;
use chrono::{DateTime, Utc};

/// Persistence for user identities.
pub trait UserStore: Send + Sync {
    /// Insert a new user. Fails with `AlreadyExists` when the login is taken.
    fn create_user(&self, login: &str, password_hash: &str) -> Result<User>;

    /// Exact, case-sensitive login lookup.
    fn find_by_login(&self, login: &str) -> Result<Option<User>>;

    fn find_by_id(&self, id: &UserId) -> Result<Option<User>>;
}

/// Persistence for secret records keyed by `(owner, id)`.
///
/// Timestamps are assigned by the store while it holds its write lock, so
/// every `updated_at` it hands out is ordered consistently with the cursors
/// returned from `changes_since`.
pub trait RecordStore: Send + Sync {
    /// Insert or overwrite `(owner, id)` atomically.
    ///
    /// New records start at version 1; existing ones (including soft-deleted
    /// ones, which are revived) move to version + 1. When `expected_version`
    /// is given it must equal the stored version (0 meaning "does not exist
    /// yet", which a soft-deleted record also satisfies), otherwise nothing
    /// is written and `Conflict` is returned.
    fn save_record(
        &self,
        owner: &UserId,
        id: &str,
        draft: &RecordDraft,
        expected_version: Option<u64>,
    ) -> Result<SaveOutcome>;

    /// A live (not deleted) record of this owner.
    fn get_record(&self, owner: &UserId, id: &str) -> Result<Option<SecretRecord>>;

    /// Live records of this owner, optionally of one type.
    fn list_records(&self, owner: &UserId, filter: Option<RecordType>) -> Result<Vec<SecretRecord>>;

    /// Soft-delete. Returns whether a live record was found.
    fn delete_record(&self, owner: &UserId, id: &str) -> Result<bool>;

    /// Live records with `updated_at` strictly after `since` (all of them when
    /// `since` is `None`), together with the store's current time as the next
    /// cursor.
    fn changes_since(&self, owner: &UserId, since: Option<DateTime<Utc>>) -> Result<ChangeSet>;

    /// Permanently remove records soft-deleted before `cutoff`.
    fn purge_deleted_before(&self, cutoff: DateTime<Utc>) -> Result<usize>;
}
