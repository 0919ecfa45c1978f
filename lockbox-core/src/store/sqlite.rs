//! SQLite storage backend.

use super::schema;
use super::{RecordStore, UserStore};
use crate::models::{
    from_micros, to_micros, ChangeSet, MetadataEntry, RecordDraft, RecordType, SaveOutcome,
    SecretRecord, User, UserId,
};
use crate::{LockboxError, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const RECORD_COLUMNS: &str = "owner_id, record_id, record_type, name, payload, metadata,
                              version, created_at, updated_at, deleted_at";

/// Thread-safe SQLite store implementing both storage contracts.
///
/// All access goes through one connection behind a mutex, so every operation
/// is serialized. Timestamps come from a store clock that never repeats a
/// value, which keeps `updated_at` and sync cursors totally ordered.
#[derive(Clone)]
pub struct SqliteStore {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    conn: Connection,
    /// Last timestamp handed out, in unix microseconds.
    last_stamp: i64,
}

impl Inner {
    /// Current time, nudged forward so it is strictly after the previous stamp.
    fn stamp(&mut self) -> i64 {
        let now = to_micros(Utc::now());
        self.last_stamp = now.max(self.last_stamp + 1);
        self.last_stamp
    }
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")?;
        Self::from_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        schema::migrate(&mut conn)?;

        // Resume the clock past anything already written, in case the wall
        // clock went backwards across a restart.
        let last_stamp: Option<i64> =
            conn.query_row("SELECT MAX(updated_at) FROM records", [], |row| row.get(0))?;

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                conn,
                last_stamp: last_stamp.unwrap_or(0),
            })),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| LockboxError::Internal(format!("Lock error: {}", e)))
    }
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, message.into())
}

fn timestamp(column: usize, micros: i64) -> rusqlite::Result<DateTime<Utc>> {
    from_micros(micros).ok_or_else(|| conversion_error(column, format!("bad timestamp {}", micros)))
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<SecretRecord> {
    let kind: String = row.get(2)?;
    let record_type = RecordType::parse(&kind)
        .ok_or_else(|| conversion_error(2, format!("unknown record type {:?}", kind)))?;
    let metadata_json: String = row.get(5)?;
    let metadata: Vec<MetadataEntry> = serde_json::from_str(&metadata_json)
        .map_err(|e| conversion_error(5, format!("bad metadata: {}", e)))?;
    let deleted_at: Option<i64> = row.get(9)?;

    Ok(SecretRecord {
        owner: UserId::new(row.get::<_, String>(0)?),
        id: row.get(1)?,
        record_type,
        name: row.get(3)?,
        payload: row.get(4)?,
        metadata,
        version: row.get::<_, i64>(6)? as u64,
        created_at: timestamp(7, row.get(7)?)?,
        updated_at: timestamp(8, row.get(8)?)?,
        deleted_at: deleted_at.map(|ts| timestamp(9, ts)).transpose()?,
    })
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::new(row.get::<_, String>(0)?),
        login: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: timestamp(3, row.get(3)?)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

impl UserStore for SqliteStore {
    fn create_user(&self, login: &str, password_hash: &str) -> Result<User> {
        let inner = self.lock()?;
        let user = User {
            id: UserId::generate(),
            login: login.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };

        let inserted = inner.conn.execute(
            "INSERT INTO users (user_id, login, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id.as_str(),
                user.login,
                user.password_hash,
                to_micros(user.created_at)
            ],
        );

        match inserted {
            Ok(_) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(LockboxError::AlreadyExists),
            Err(e) => Err(e.into()),
        }
    }

    fn find_by_login(&self, login: &str) -> Result<Option<User>> {
        let inner = self.lock()?;
        let user = inner
            .conn
            .query_row(
                "SELECT user_id, login, password_hash, created_at FROM users WHERE login = ?1",
                [login],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    fn find_by_id(&self, id: &UserId) -> Result<Option<User>> {
        let inner = self.lock()?;
        let user = inner
            .conn
            .query_row(
                "SELECT user_id, login, password_hash, created_at FROM users WHERE user_id = ?1",
                [id.as_str()],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }
}

impl RecordStore for SqliteStore {
    fn save_record(
        &self,
        owner: &UserId,
        id: &str,
        draft: &RecordDraft,
        expected_version: Option<u64>,
    ) -> Result<SaveOutcome> {
        let metadata = serde_json::to_string(&draft.metadata)
            .map_err(|e| LockboxError::Internal(format!("metadata serialization: {}", e)))?;

        let mut guard = self.lock()?;
        let inner = &mut *guard;
        let now = inner.stamp();
        let tx = inner
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<(i64, bool)> = tx
            .query_row(
                "SELECT version, deleted_at IS NOT NULL FROM records
                 WHERE owner_id = ?1 AND record_id = ?2",
                params![owner.as_str(), id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        if let Some(expected) = expected_version {
            let (current, deleted) = existing
                .map(|(version, deleted)| (version as u64, deleted))
                .unwrap_or((0, true));
            // A deleted record is absent to callers, so "expect 0" may revive it.
            if expected != current && !(deleted && expected == 0) {
                return Err(LockboxError::Conflict(format!(
                    "expected version {}, found {}",
                    expected, current
                )));
            }
        }

        let version = match existing {
            Some((version, false)) => {
                tx.execute(
                    "UPDATE records
                     SET record_type = ?3, name = ?4, payload = ?5, metadata = ?6,
                         version = ?7, updated_at = ?8
                     WHERE owner_id = ?1 AND record_id = ?2",
                    params![
                        owner.as_str(),
                        id,
                        draft.record_type.as_str(),
                        draft.name,
                        draft.payload,
                        metadata,
                        version + 1,
                        now
                    ],
                )?;
                version + 1
            }
            Some((version, true)) => {
                tx.execute(
                    "UPDATE records
                     SET record_type = ?3, name = ?4, payload = ?5, metadata = ?6,
                         version = ?7, created_at = ?8, updated_at = ?8, deleted_at = NULL
                     WHERE owner_id = ?1 AND record_id = ?2",
                    params![
                        owner.as_str(),
                        id,
                        draft.record_type.as_str(),
                        draft.name,
                        draft.payload,
                        metadata,
                        version + 1,
                        now
                    ],
                )?;
                version + 1
            }
            None => {
                tx.execute(
                    "INSERT INTO records (owner_id, record_id, record_type, name, payload,
                                          metadata, version, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)",
                    params![
                        owner.as_str(),
                        id,
                        draft.record_type.as_str(),
                        draft.name,
                        draft.payload,
                        metadata,
                        now
                    ],
                )?;
                1
            }
        };

        tx.commit()?;

        Ok(SaveOutcome {
            id: id.to_string(),
            version: version as u64,
        })
    }

    fn get_record(&self, owner: &UserId, id: &str) -> Result<Option<SecretRecord>> {
        let inner = self.lock()?;
        let record = inner
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM records
                     WHERE owner_id = ?1 AND record_id = ?2 AND deleted_at IS NULL",
                    RECORD_COLUMNS
                ),
                params![owner.as_str(), id],
                row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn list_records(
        &self,
        owner: &UserId,
        filter: Option<RecordType>,
    ) -> Result<Vec<SecretRecord>> {
        let inner = self.lock()?;
        let mut stmt = inner.conn.prepare(&format!(
            "SELECT {} FROM records
             WHERE owner_id = ?1 AND deleted_at IS NULL
               AND (?2 IS NULL OR record_type = ?2)
             ORDER BY created_at ASC, record_id ASC",
            RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map(
                params![owner.as_str(), filter.map(|kind| kind.as_str())],
                row_to_record,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    fn delete_record(&self, owner: &UserId, id: &str) -> Result<bool> {
        let mut inner = self.lock()?;
        let now = inner.stamp();

        // Payload and metadata are wiped; only the row's identity and version survive.
        let changed = inner.conn.execute(
            "UPDATE records
             SET version = version + 1, payload = X'', metadata = '[]',
                 updated_at = ?3, deleted_at = ?3
             WHERE owner_id = ?1 AND record_id = ?2 AND deleted_at IS NULL",
            params![owner.as_str(), id, now],
        )?;
        Ok(changed > 0)
    }

    fn changes_since(&self, owner: &UserId, since: Option<DateTime<Utc>>) -> Result<ChangeSet> {
        let mut inner = self.lock()?;
        // Every later write is stamped strictly after this cursor.
        let cursor = inner.stamp();

        let mut stmt = inner.conn.prepare(&format!(
            "SELECT {} FROM records
             WHERE owner_id = ?1 AND deleted_at IS NULL
               AND (?2 IS NULL OR updated_at > ?2)
             ORDER BY updated_at ASC, record_id ASC",
            RECORD_COLUMNS
        ))?;

        let records = stmt
            .query_map(params![owner.as_str(), since.map(to_micros)], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        drop(stmt);

        let cursor = from_micros(cursor)
            .ok_or_else(|| LockboxError::Internal(format!("bad cursor {}", cursor)))?;
        Ok(ChangeSet { records, cursor })
    }

    fn purge_deleted_before(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let inner = self.lock()?;
        let purged = inner.conn.execute(
            "DELETE FROM records WHERE deleted_at IS NOT NULL AND deleted_at < ?1",
            [to_micros(cutoff)],
        )?;
        Ok(purged)
    }
}
