//! Storage layer tests for the SolarLink cloud.

use solarlink_core::db::unix_timestamp;
use solarlink_core::telemetry::StatusPayload;
use std::collections::BTreeMap;

use super::db::CloudDatabase;

async fn test_db() -> CloudDatabase {
    CloudDatabase::open_in_memory().await.unwrap()
}

fn sample_status() -> StatusPayload {
    StatusPayload {
        relay_state: true,
        wifi_rssi: -64,
        uptime: 900,
        free_heap: 15000,
        confirmation_code: None,
        extra: BTreeMap::new(),
    }
}

async fn seed_device(db: &CloudDatabase, db_id: &str, identifier: &str) {
    sqlx::query("INSERT INTO devices (id, device_identifier, name, created_at) VALUES (?, ?, 'Solar Controller', ?)")
        .bind(db_id)
        .bind(identifier)
        .bind(unix_timestamp())
        .execute(db.pool())
        .await
        .unwrap();
}

// === Database lifecycle ===

#[tokio::test]
async fn open_creates_file_backed_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cloud.db");

    let db = CloudDatabase::open(&path).await.unwrap();
    db.ping().await.unwrap();
    assert!(path.exists());

    // Durable rows survive a reopen, unlike the in-memory caches.
    db.upsert_user_on_login("google-1", "alice@example.com", None, None)
        .await
        .unwrap();
    drop(db);

    let reopened = CloudDatabase::open(&path).await.unwrap();
    assert!(
        reopened
            .find_user_by_email("alice@example.com")
            .await
            .unwrap()
            .is_some()
    );
}

// === User tests ===

#[tokio::test]
async fn first_login_creates_user() {
    let db = test_db().await;
    let user = db
        .upsert_user_on_login("google-1", "alice@example.com", Some("Alice"), None)
        .await
        .unwrap();

    assert_eq!(user.external_id, "google-1");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.name.as_deref(), Some("Alice"));
    assert_eq!(user.created_at, user.last_login);
}

#[tokio::test]
async fn later_login_updates_profile_and_last_login() {
    let db = test_db().await;
    let first = db
        .upsert_user_on_login("google-1", "alice@example.com", Some("Alice"), None)
        .await
        .unwrap();

    let second = db
        .upsert_user_on_login(
            "google-1",
            "alice@new.example.com",
            Some("Alice B"),
            Some("https://pic"),
        )
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.email, "alice@new.example.com");
    assert_eq!(second.name.as_deref(), Some("Alice B"));
    assert_eq!(second.picture.as_deref(), Some("https://pic"));
    assert_eq!(second.created_at, first.created_at);
    assert!(second.last_login >= first.last_login);
}

#[tokio::test]
async fn get_user_by_id() {
    let db = test_db().await;
    let created = db
        .upsert_user_on_login("google-1", "alice@example.com", Some("Alice"), None)
        .await
        .unwrap();

    let fetched = db.get_user(&created.id).await.unwrap();
    assert_eq!(fetched.email, "alice@example.com");

    assert!(db.get_user("missing").await.is_err());
}

#[tokio::test]
async fn find_user_by_email() {
    let db = test_db().await;
    db.upsert_user_on_login("google-1", "alice@example.com", None, None)
        .await
        .unwrap();

    assert!(
        db.find_user_by_email("alice@example.com")
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        db.find_user_by_email("bob@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

// === Device tests ===

#[tokio::test]
async fn device_exists_reflects_rows() {
    let db = test_db().await;
    assert!(!db.device_exists("D1").await.unwrap());

    seed_device(&db, "dev1", "D1").await;
    assert!(db.device_exists("D1").await.unwrap());
}

#[tokio::test]
async fn get_device_not_found() {
    let db = test_db().await;
    assert!(db.get_device("missing").await.is_err());
}

// === History tests ===

#[tokio::test]
async fn append_and_read_history() {
    let db = test_db().await;
    seed_device(&db, "dev1", "D1").await;

    db.append_history("D1", &sample_status()).await.unwrap();
    db.append_history("D1", &sample_status()).await.unwrap();

    let history = db.recent_history("D1", 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].device_identifier, "D1");
    assert_eq!(history[0].relay_state, 1);
    assert_eq!(history[0].wifi_rssi, -64);
}

#[tokio::test]
async fn recent_history_honors_limit() {
    let db = test_db().await;
    for _ in 0..5 {
        db.append_history("D1", &sample_status()).await.unwrap();
    }

    let history = db.recent_history("D1", 3).await.unwrap();
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn purge_removes_only_rows_past_cutoff() {
    let db = test_db().await;
    let now = unix_timestamp();

    // One old row, one fresh row
    sqlx::query(
        "INSERT INTO device_history (device_identifier, relay_state, wifi_rssi, uptime, free_heap, timestamp)
         VALUES ('D1', 1, -60, 100, 15000, ?)",
    )
    .bind(now - 100)
    .execute(db.pool())
    .await
    .unwrap();
    db.append_history("D1", &sample_status()).await.unwrap();

    let removed = db.purge_history_before(now - 50).await.unwrap();
    assert_eq!(removed, 1);

    let history = db.recent_history("D1", 10).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn ping_succeeds() {
    let db = test_db().await;
    db.ping().await.unwrap();
}
