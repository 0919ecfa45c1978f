use lockbox_core::client::LockboxClient;
use lockbox_core::crypto::HashingParams;
use lockbox_core::{LockboxError, RecordDraft, RecordType, SqliteStore};
use lockbox_server::{build_router, AppState, ServerConfig};
use std::time::Duration;

/// Serve a fresh in-memory server on an ephemeral port; returns its base url.
async fn spawn_server(access_ttl_secs: u64) -> String {
    spawn_server_with(ServerConfig {
        access_token_ttl_secs: access_ttl_secs,
        ..ServerConfig::default()
    })
    .await
}

async fn spawn_server_with(config: ServerConfig) -> String {
    let session = config
        .session_config(b"roundtrip-secret".to_vec())
        .unwrap()
        .with_hashing(HashingParams {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        });
    let state = AppState::new(SqliteStore::in_memory().unwrap(), session).unwrap();
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

#[tokio::test]
async fn test_full_session_over_http() {
    let base = spawn_server(900).await;
    let client = LockboxClient::new(&base).unwrap();

    let user_id = client.register("alice", "p1").await.unwrap();
    assert!(!user_id.is_empty());
    assert!(matches!(
        client.register("alice", "p2").await,
        Err(LockboxError::AlreadyExists)
    ));

    let tokens = client.login("alice", "p1").await.unwrap();
    assert!(tokens.expires_in_seconds > 0);

    let draft = RecordDraft::new(RecordType::Text, "note", b"hi".to_vec());
    let first = client.save_record(&draft, None).await.unwrap();
    assert_eq!(first.version, 1);
    let first_saved_at = client.get_record(&first.id).await.unwrap().updated_at;

    let update =
        RecordDraft::new(RecordType::Text, "note", b"hi2".to_vec()).with_id(first.id.clone());
    let second = client.save_record(&update, Some(1)).await.unwrap();
    assert_eq!(second.version, 2);

    let record = client.get_record(&first.id).await.unwrap();
    assert_eq!(record.payload, b"hi2");
    assert_eq!(record.version, 2);

    let full = client.sync_records(0).await.unwrap();
    assert_eq!(full.records.len(), 1);
    assert_eq!(full.records[0].version, 2);

    let delta = client.sync_records(first_saved_at).await.unwrap();
    assert_eq!(delta.records.len(), 1);
    assert_eq!(delta.records[0].payload, b"hi2");

    let stale = client.save_record(&update, Some(1)).await;
    assert!(matches!(stale, Err(LockboxError::Conflict(_))));

    client.delete_record(&first.id).await.unwrap();
    assert!(matches!(
        client.get_record(&first.id).await,
        Err(LockboxError::NotFound)
    ));
    assert!(client.list_records(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_client_refreshes_rejected_access_token() {
    let base = spawn_server(900).await;
    let client = LockboxClient::new(&base).unwrap();
    client.register("bob", "pw").await.unwrap();
    let tokens = client.login("bob", "pw").await.unwrap();

    // Simulate an expired access token alongside a still-valid refresh token.
    client
        .set_tokens("expired-access".to_string(), tokens.refresh_token.clone())
        .unwrap();

    let records = client.list_records(Some(RecordType::Binary)).await.unwrap();
    assert!(records.is_empty());

    let current = client.access_token().unwrap().unwrap();
    assert_ne!(current, "expired-access");
    assert_ne!(current, tokens.access_token);
}

#[tokio::test]
async fn test_client_without_session_is_unauthenticated() {
    let base = spawn_server(900).await;
    let client = LockboxClient::new(&base).unwrap();

    assert!(matches!(
        client.list_records(None).await,
        Err(LockboxError::Unauthenticated)
    ));
    assert!(matches!(
        client.refresh().await,
        Err(LockboxError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_access_token_expiry_is_recovered_by_refresh() {
    let base = spawn_server(1).await;
    let client = LockboxClient::new(&base).unwrap();
    client.register("carol", "pw").await.unwrap();
    client.login("carol", "pw").await.unwrap();

    let draft = RecordDraft::new(RecordType::CredentialPair, "mail", b"u:p".to_vec())
        .with_metadata("url", "https://mail.example.com");
    let saved = client.save_record(&draft, None).await.unwrap();

    tokio::time::sleep(Duration::from_millis(2100)).await;

    let record = client.get_record(&saved.id).await.unwrap();
    assert_eq!(record.metadata.len(), 1);
    assert_eq!(record.metadata[0].value, "https://mail.example.com");
}

#[tokio::test]
async fn test_oversized_payload_is_a_validation_error() {
    let base = spawn_server_with(ServerConfig {
        max_payload_size: 4096,
        ..ServerConfig::default()
    })
    .await;
    let client = LockboxClient::new(&base).unwrap();
    client.register("dave", "pw").await.unwrap();
    client.login("dave", "pw").await.unwrap();

    let draft = RecordDraft::new(RecordType::Binary, "blob", vec![0u8; 8192]);
    assert!(matches!(
        client.save_record(&draft, None).await,
        Err(LockboxError::Validation(_))
    ));
    assert!(client.list_records(None).await.unwrap().is_empty());
}
