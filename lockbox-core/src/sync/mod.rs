//! Versioned record sync for Lockbox
//!
//! Owner-scoped record operations on top of a [`RecordStore`](crate::store::RecordStore):
//! - Save with monotonic per-record versions and optional compare-and-swap
//! - Get / list / idempotent soft delete
//! - Incremental sync driven by a timestamp cursor
//! - Purge of old tombstones

mod engine;

pub use engine::SyncEngine;

#[cfg(test)]
mod tests;
