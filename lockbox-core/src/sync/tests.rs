use super::*;
use crate::models::{to_micros, RecordDraft, RecordType, UserId};
use crate::store::SqliteStore;
use crate::LockboxError;
use chrono::Duration;
use std::collections::HashSet;

fn engine() -> SyncEngine<SqliteStore> {
    SyncEngine::new(SqliteStore::in_memory().unwrap())
}

fn text(name: &str, payload: &str) -> RecordDraft {
    RecordDraft::new(RecordType::Text, name, payload.as_bytes().to_vec())
}

#[test]
fn test_save_then_get_returns_what_was_saved() {
    let engine = engine();
    let alice = UserId::new("alice");
    let draft = RecordDraft::new(RecordType::CredentialPair, "github", b"{\"u\":\"a\"}".to_vec())
        .with_metadata("url", "https://github.com");

    let outcome = engine.save(&alice, Some(&draft), None).unwrap();
    assert_eq!(outcome.version, 1);

    let record = engine.get(&alice, &outcome.id).unwrap();
    assert_eq!(record.id, outcome.id);
    assert_eq!(record.owner, alice);
    assert_eq!(record.record_type, RecordType::CredentialPair);
    assert_eq!(record.name, "github");
    assert_eq!(record.payload, draft.payload);
    assert_eq!(record.metadata, draft.metadata);
    assert_eq!(record.created_at, record.updated_at);
}

#[test]
fn test_save_requires_record() {
    let engine = engine();
    assert!(matches!(
        engine.save(&UserId::new("alice"), None, None),
        Err(LockboxError::Validation(_))
    ));
}

#[test]
fn test_missing_or_empty_id_is_assigned() {
    let engine = engine();
    let alice = UserId::new("alice");

    let a = engine.save(&alice, Some(&text("a", "1")), None).unwrap();
    let b = engine
        .save(&alice, Some(&text("b", "2").with_id("")), None)
        .unwrap();

    assert!(uuid::Uuid::parse_str(&a.id).is_ok());
    assert!(uuid::Uuid::parse_str(&b.id).is_ok());
    assert_ne!(a.id, b.id);
    assert_eq!(engine.list(&alice, None).unwrap().len(), 2);
}

#[test]
fn test_every_save_bumps_version_by_one() {
    let engine = engine();
    let alice = UserId::new("alice");
    let first = engine.save(&alice, Some(&text("n", "0")), None).unwrap();

    for expected in 2..=6u64 {
        let outcome = engine
            .save(
                &alice,
                Some(&text("n", &expected.to_string()).with_id(first.id.clone())),
                None,
            )
            .unwrap();
        assert_eq!(outcome.id, first.id);
        assert_eq!(outcome.version, expected);
    }
}

#[test]
fn test_note_scenario() {
    let engine = engine();
    let alice = UserId::new("alice");

    let first = engine.save(&alice, Some(&text("note", "hi")), None).unwrap();
    assert_eq!(first.version, 1);
    let first_saved_at = to_micros(engine.get(&alice, &first.id).unwrap().updated_at);

    let second = engine
        .save(&alice, Some(&text("note", "hi2").with_id(first.id.clone())), None)
        .unwrap();
    assert_eq!(second.version, 2);

    let record = engine.get(&alice, &first.id).unwrap();
    assert_eq!(record.payload, b"hi2");
    assert_eq!(record.version, 2);

    let full = engine.sync(&alice, 0).unwrap();
    assert_eq!(full.records.len(), 1);
    assert_eq!(full.records[0].id, first.id);
    assert_eq!(full.records[0].version, 2);

    let delta = engine.sync(&alice, first_saved_at).unwrap();
    assert_eq!(delta.records.len(), 1);
    assert_eq!(delta.records[0].version, 2);
    assert_eq!(delta.records[0].payload, b"hi2");
}

#[test]
fn test_expected_version_conflict() {
    let engine = engine();
    let alice = UserId::new("alice");
    let saved = engine
        .save(&alice, Some(&text("n", "v1").with_id("r1")), Some(0))
        .unwrap();
    assert_eq!(saved.version, 1);

    // Two writers both observed version 1; only the first wins.
    let winner = engine
        .save(&alice, Some(&text("n", "mine").with_id("r1")), Some(1))
        .unwrap();
    assert_eq!(winner.version, 2);
    let loser = engine.save(&alice, Some(&text("n", "theirs").with_id("r1")), Some(1));
    assert!(matches!(loser, Err(LockboxError::Conflict(_))));

    assert_eq!(engine.get(&alice, "r1").unwrap().payload, b"mine");
}

#[test]
fn test_get_validation_and_not_found() {
    let engine = engine();
    let alice = UserId::new("alice");
    assert!(matches!(
        engine.get(&alice, ""),
        Err(LockboxError::Validation(_))
    ));
    assert!(matches!(
        engine.get(&alice, "nope"),
        Err(LockboxError::NotFound)
    ));
}

#[test]
fn test_list_filter_and_empty() {
    let engine = engine();
    let alice = UserId::new("alice");
    assert!(engine.list(&alice, None).unwrap().is_empty());

    engine.save(&alice, Some(&text("t", "1")), None).unwrap();
    engine
        .save(
            &alice,
            Some(&RecordDraft::new(RecordType::Binary, "b", vec![1, 2, 3])),
            None,
        )
        .unwrap();

    let texts = engine.list(&alice, Some(RecordType::Text)).unwrap();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].record_type, RecordType::Text);
    assert!(engine
        .list(&alice, Some(RecordType::PaymentCard))
        .unwrap()
        .is_empty());
}

#[test]
fn test_delete_is_idempotent_and_hides_record() {
    let engine = engine();
    let alice = UserId::new("alice");
    let saved = engine.save(&alice, Some(&text("n", "x")), None).unwrap();

    engine.delete(&alice, &saved.id).unwrap();
    engine.delete(&alice, &saved.id).unwrap();
    engine.delete(&alice, "never-existed").unwrap();

    assert!(matches!(
        engine.get(&alice, &saved.id),
        Err(LockboxError::NotFound)
    ));
    assert!(engine.list(&alice, None).unwrap().is_empty());
    assert!(engine.sync(&alice, 0).unwrap().records.is_empty());
    assert!(matches!(
        engine.delete(&alice, ""),
        Err(LockboxError::Validation(_))
    ));
}

#[test]
fn test_deleted_record_not_resent_by_incremental_sync() {
    let engine = engine();
    let alice = UserId::new("alice");
    let saved = engine.save(&alice, Some(&text("n", "x")), None).unwrap();
    let cursor = to_micros(engine.sync(&alice, 0).unwrap().cursor);

    engine.delete(&alice, &saved.id).unwrap();
    assert!(engine.sync(&alice, cursor).unwrap().records.is_empty());
}

#[test]
fn test_resave_after_delete_continues_version() {
    let engine = engine();
    let alice = UserId::new("alice");
    let saved = engine
        .save(&alice, Some(&text("n", "x").with_id("r1")), None)
        .unwrap();
    engine.delete(&alice, &saved.id).unwrap();

    let revived = engine
        .save(&alice, Some(&text("n", "y").with_id("r1")), None)
        .unwrap();
    assert!(revived.version > saved.version);
    assert_eq!(engine.get(&alice, "r1").unwrap().payload, b"y");
}

#[test]
fn test_owner_isolation() {
    let engine = engine();
    let alice = UserId::new("alice");
    let bob = UserId::new("bob");

    let secret = engine
        .save(&bob, Some(&text("bank", "pin").with_id("bob-1")), None)
        .unwrap();

    assert!(matches!(
        engine.get(&alice, &secret.id),
        Err(LockboxError::NotFound)
    ));
    assert!(engine.list(&alice, None).unwrap().is_empty());
    assert!(engine.sync(&alice, 0).unwrap().records.is_empty());

    // Alice "deleting" bob's id and saving over it only touches her namespace.
    engine.delete(&alice, &secret.id).unwrap();
    let hers = engine
        .save(&alice, Some(&text("mine", "x").with_id("bob-1")), None)
        .unwrap();
    assert_eq!(hers.version, 1);

    let bobs = engine.get(&bob, "bob-1").unwrap();
    assert_eq!(bobs.version, 1);
    assert_eq!(bobs.payload, b"pin");
}

#[test]
fn test_full_sync_is_superset_of_incremental() {
    let engine = engine();
    let alice = UserId::new("alice");

    engine.save(&alice, Some(&text("a", "1")), None).unwrap();
    let mid = to_micros(engine.sync(&alice, 0).unwrap().cursor);
    engine.save(&alice, Some(&text("b", "2")), None).unwrap();
    engine.save(&alice, Some(&text("c", "3")), None).unwrap();

    let full: HashSet<String> = engine
        .sync(&alice, 0)
        .unwrap()
        .records
        .into_iter()
        .map(|r| r.id)
        .collect();
    let delta = engine.sync(&alice, mid).unwrap();

    assert_eq!(full.len(), 3);
    assert_eq!(delta.records.len(), 2);
    for record in &delta.records {
        assert!(full.contains(&record.id));
        assert!(to_micros(record.updated_at) > mid);
    }
}

#[test]
fn test_sync_never_returns_records_at_or_before_cursor() {
    let engine = engine();
    let alice = UserId::new("alice");
    let mut stamps = Vec::new();
    for i in 0..5 {
        let saved = engine
            .save(&alice, Some(&text("n", &i.to_string())), None)
            .unwrap();
        stamps.push(to_micros(engine.get(&alice, &saved.id).unwrap().updated_at));
    }

    for cursor in stamps {
        for record in engine.sync(&alice, cursor).unwrap().records {
            assert!(to_micros(record.updated_at) > cursor);
        }
    }
}

#[test]
fn test_cursor_chain_misses_nothing() {
    let engine = engine();
    let alice = UserId::new("alice");
    let mut cursor = 0;
    let mut seen = HashSet::new();

    for round in 0..4 {
        engine
            .save(&alice, Some(&text("n", &round.to_string())), None)
            .unwrap();
        let changes = engine.sync(&alice, cursor).unwrap();
        for record in changes.records {
            seen.insert(record.id);
        }
        cursor = to_micros(changes.cursor);
    }

    assert_eq!(seen.len(), 4);
    assert!(engine.sync(&alice, cursor).unwrap().records.is_empty());
}

#[test]
fn test_negative_cursor_rejected() {
    let engine = engine();
    assert!(matches!(
        engine.sync(&UserId::new("alice"), -1),
        Err(LockboxError::Validation(_))
    ));
}

#[test]
fn test_concurrent_saves_each_increment() {
    let engine = std::sync::Arc::new(engine());
    let alice = UserId::new("alice");
    engine
        .save(&alice, Some(&text("n", "0").with_id("shared")), None)
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = engine.clone();
            let alice = alice.clone();
            std::thread::spawn(move || {
                (0..25)
                    .map(|i| {
                        engine
                            .save(&alice, Some(&text("n", &i.to_string()).with_id("shared")), None)
                            .unwrap()
                            .version
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut versions: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    versions.sort_unstable();

    let expected: Vec<u64> = (2..=101).collect();
    assert_eq!(versions, expected);
}

#[test]
fn test_purge_respects_retention() {
    let engine = engine();
    let alice = UserId::new("alice");
    let saved = engine.save(&alice, Some(&text("n", "x")), None).unwrap();
    engine.delete(&alice, &saved.id).unwrap();

    assert_eq!(engine.purge_deleted(Duration::days(30)).unwrap(), 0);
    assert_eq!(engine.purge_deleted(Duration::MAX).unwrap(), 0);
    assert_eq!(engine.purge_deleted(Duration::seconds(-1)).unwrap(), 1);
}
