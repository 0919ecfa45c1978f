//! Schema versioning for the SQLite backend.

use crate::{LockboxError, Result};
use rusqlite::{Connection, OptionalExtension};

/// Current schema version. Incremented when the schema changes.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// Ordered migrations; entry `n` upgrades version `n` to `n + 1`.
const MIGRATIONS: &[&str] = &[
    // v1: users and records
    "CREATE TABLE IF NOT EXISTS users (
        user_id TEXT PRIMARY KEY,
        login TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS records (
        owner_id TEXT NOT NULL,
        record_id TEXT NOT NULL,
        record_type TEXT NOT NULL,
        name TEXT NOT NULL,
        payload BLOB NOT NULL,
        metadata TEXT NOT NULL DEFAULT '[]',
        version INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        deleted_at INTEGER,
        PRIMARY KEY (owner_id, record_id)
    );

    CREATE INDEX IF NOT EXISTS idx_records_owner_updated
        ON records(owner_id, updated_at);
    CREATE INDEX IF NOT EXISTS idx_records_deleted_at
        ON records(deleted_at);",
];

/// Bring the database up to `CURRENT_SCHEMA_VERSION`.
pub(super) fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        )",
    )?;

    let current: i64 = conn
        .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?
        .unwrap_or(0);

    if current > CURRENT_SCHEMA_VERSION {
        return Err(LockboxError::Internal(format!(
            "database schema v{} is newer than supported v{}",
            current, CURRENT_SCHEMA_VERSION
        )));
    }

    for (index, sql) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let target = index as i64 + 1;
        let tx = conn.transaction()?;
        tx.execute_batch(sql)?;
        tx.execute(
            "INSERT INTO schema_version (id, version) VALUES (1, ?1)
             ON CONFLICT(id) DO UPDATE SET version = excluded.version",
            [target],
        )?;
        tx.commit()?;
        tracing::info!("Applied schema migration v{}", target);
    }

    Ok(())
}
