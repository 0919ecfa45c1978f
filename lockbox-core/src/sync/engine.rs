//! Sync engine: owner-scoped save/get/list/delete and cursor-based sync.

use crate::models::{
    from_micros, ChangeSet, RecordDraft, RecordType, SaveOutcome, SecretRecord, UserId,
};
use crate::store::RecordStore;
use crate::{LockboxError, Result};
use chrono::{Duration, Utc};

/// Record operations for an already-resolved owner.
///
/// Every method takes the owner explicitly; the engine never looks at
/// credentials and never crosses owners.
pub struct SyncEngine<S> {
    store: S,
}

impl<S: RecordStore> SyncEngine<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Insert or overwrite a record, returning its id and new version.
    ///
    /// A missing or empty id gets a fresh UUID. With `expected_version` set,
    /// the save only applies if the stored version still matches.
    pub fn save(
        &self,
        owner: &UserId,
        record: Option<&RecordDraft>,
        expected_version: Option<u64>,
    ) -> Result<SaveOutcome> {
        let draft =
            record.ok_or_else(|| LockboxError::Validation("record is required".to_string()))?;

        let id = match draft.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        };

        let outcome = self.store.save_record(owner, &id, draft, expected_version)?;
        tracing::debug!(
            "Saved record {} for {} at version {}",
            outcome.id,
            owner,
            outcome.version
        );
        Ok(outcome)
    }

    pub fn get(&self, owner: &UserId, id: &str) -> Result<SecretRecord> {
        require_id(id)?;
        self.store
            .get_record(owner, id)?
            .ok_or(LockboxError::NotFound)
    }

    pub fn list(&self, owner: &UserId, filter: Option<RecordType>) -> Result<Vec<SecretRecord>> {
        self.store.list_records(owner, filter)
    }

    /// Soft-delete a record. Deleting something already gone is not an error.
    pub fn delete(&self, owner: &UserId, id: &str) -> Result<()> {
        require_id(id)?;
        if self.store.delete_record(owner, id)? {
            tracing::debug!("Deleted record {} for {}", id, owner);
        } else {
            tracing::debug!("Delete of absent record {} for {}", id, owner);
        }
        Ok(())
    }

    /// Records changed after `cursor` (unix microseconds; 0 means all) and
    /// the cursor to send next time.
    pub fn sync(&self, owner: &UserId, cursor: i64) -> Result<ChangeSet> {
        let since = match cursor {
            0 => None,
            c if c < 0 => {
                return Err(LockboxError::Validation(format!(
                    "cursor must not be negative, got {}",
                    c
                )))
            }
            c => Some(from_micros(c).ok_or_else(|| {
                LockboxError::Validation(format!("cursor out of range: {}", c))
            })?),
        };

        let changes = self.store.changes_since(owner, since)?;
        tracing::debug!(
            "Sync for {} from cursor {}: {} record(s)",
            owner,
            cursor,
            changes.records.len()
        );
        Ok(changes)
    }

    /// Permanently drop records soft-deleted more than `retention` ago.
    pub fn purge_deleted(&self, retention: Duration) -> Result<usize> {
        let Some(cutoff) = Utc::now().checked_sub_signed(retention) else {
            return Ok(0);
        };
        let purged = self.store.purge_deleted_before(cutoff)?;
        if purged > 0 {
            tracing::info!("Purged {} deleted record(s)", purged);
        }
        Ok(purged)
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(LockboxError::Validation("record id is required".to_string()));
    }
    Ok(())
}
