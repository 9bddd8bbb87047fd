//! Telemetry ingestor tests.
//!
//! All in-memory state starts empty (nothing survives a restart), so each
//! test builds its own cache, ledger, and in-memory database.

use super::TelemetryIngestor;
use crate::state::{PairingLedger, StatusCache};
use crate::storage::CloudDatabase;

async fn ingestor() -> (TelemetryIngestor, StatusCache, PairingLedger, CloudDatabase) {
    let statuses = StatusCache::new();
    let codes = PairingLedger::new();
    let db = CloudDatabase::open_in_memory().await.unwrap();
    let ingestor = TelemetryIngestor::new(
        "solar".to_string(),
        statuses.clone(),
        codes.clone(),
        db.clone(),
    );
    (ingestor, statuses, codes, db)
}

const STATUS_WITH_CODE: &[u8] =
    br#"{"relayState":true,"wifiRSSI":-60,"uptime":300,"freeHeap":17000,"confirmationCode":"123456"}"#;
const STATUS_PLAIN: &[u8] = br#"{"relayState":false,"wifiRSSI":-72,"uptime":301,"freeHeap":16500}"#;

#[tokio::test]
async fn status_message_updates_cache_and_ledger() {
    let (ingestor, statuses, codes, _db) = ingestor().await;

    ingestor
        .handle_message("solar/D1/status", STATUS_WITH_CODE)
        .await;

    let snapshot = statuses.get("D1").await.unwrap();
    assert!(snapshot.relay_state);
    assert!(snapshot.online);
    assert!(codes.matches("D1", "123456").await);
}

#[tokio::test]
async fn newer_code_overwrites_older() {
    let (ingestor, _statuses, codes, _db) = ingestor().await;

    ingestor
        .handle_message("solar/D1/status", STATUS_WITH_CODE)
        .await;
    ingestor
        .handle_message(
            "solar/D1/status",
            br#"{"relayState":true,"wifiRSSI":-60,"uptime":310,"freeHeap":17000,"confirmationCode":"654321"}"#,
        )
        .await;

    assert!(!codes.matches("D1", "123456").await);
    assert!(codes.matches("D1", "654321").await);
}

#[tokio::test]
async fn unclaimed_device_writes_no_history() {
    let (ingestor, _statuses, _codes, db) = ingestor().await;

    ingestor
        .handle_message("solar/D1/status", STATUS_PLAIN)
        .await;

    assert!(db.recent_history("D1", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn claimed_device_appends_history() {
    let (ingestor, _statuses, _codes, db) = ingestor().await;

    // Seed a claimed device directly.
    sqlx::query("INSERT INTO devices (id, device_identifier, name, created_at) VALUES ('dev1', 'D1', 'Solar Controller', 0)")
        .execute(db.pool())
        .await
        .unwrap();

    ingestor
        .handle_message("solar/D1/status", STATUS_PLAIN)
        .await;

    let history = db.recent_history("D1", 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].relay_state, 0);
    assert_eq!(history[0].wifi_rssi, -72);
}

#[tokio::test]
async fn malformed_status_is_dropped() {
    let (ingestor, statuses, codes, _db) = ingestor().await;

    ingestor
        .handle_message("solar/D1/status", b"{not valid json")
        .await;

    assert!(statuses.get("D1").await.is_none());
    assert!(!codes.matches("D1", "123456").await);
}

#[tokio::test]
async fn online_message_merges_into_snapshot() {
    let (ingestor, statuses, _codes, _db) = ingestor().await;

    ingestor
        .handle_message("solar/D1/status", STATUS_WITH_CODE)
        .await;
    ingestor.handle_message("solar/D1/online", b"false").await;

    let snapshot = statuses.get("D1").await.unwrap();
    assert!(!snapshot.online);
    // Other fields survive the merge
    assert!(snapshot.relay_state);
    assert_eq!(snapshot.wifi_rssi, -60);
}

#[tokio::test]
async fn malformed_online_is_dropped() {
    let (ingestor, statuses, _codes, _db) = ingestor().await;

    ingestor
        .handle_message("solar/D1/status", STATUS_WITH_CODE)
        .await;
    ingestor.handle_message("solar/D1/online", b"maybe").await;

    assert!(statuses.get("D1").await.unwrap().online);
}

#[tokio::test]
async fn unknown_topics_are_ignored() {
    let (ingestor, statuses, _codes, _db) = ingestor().await;

    ingestor
        .handle_message("solar/D1/command", STATUS_PLAIN)
        .await;
    ingestor
        .handle_message("other/D1/status", STATUS_PLAIN)
        .await;
    ingestor.handle_message("solar/D1", STATUS_PLAIN).await;

    assert!(statuses.get("D1").await.is_none());
}
