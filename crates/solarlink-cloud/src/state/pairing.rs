//! Outstanding confirmation codes, keyed by device identifier.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

/// Short-lived ledger of device-generated confirmation codes.
///
/// A device may publish a fresh code before the previous one is claimed;
/// only the latest is valid. Codes are consumed only after a claim commits,
/// so a failed claim can be retried with the same code.
#[derive(Clone, Default)]
pub struct PairingLedger {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl PairingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a code, overwriting any prior code for the device.
    pub async fn put(&self, device_id: &str, code: &str) {
        self.inner
            .write()
            .await
            .insert(device_id.to_string(), code.to_string());
    }

    /// Check a code without consuming it.
    pub async fn matches(&self, device_id: &str, code: &str) -> bool {
        self.inner
            .read()
            .await
            .get(device_id)
            .is_some_and(|stored| stored == code)
    }

    /// Remove the device's code only if it still equals `code`. Called after
    /// a successful claim commit; a newer code the device published while
    /// the claim was in flight stays valid.
    pub async fn consume_if_matches(&self, device_id: &str, code: &str) -> bool {
        let mut map = self.inner.write().await;
        if map.get(device_id).is_some_and(|stored| stored == code) {
            map.remove(device_id);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn latest_code_wins() {
        let ledger = PairingLedger::new();
        ledger.put("d1", "111111").await;
        ledger.put("d1", "222222").await;

        assert!(!ledger.matches("d1", "111111").await);
        assert!(ledger.matches("d1", "222222").await);
    }

    #[tokio::test]
    async fn consume_is_once() {
        let ledger = PairingLedger::new();
        ledger.put("d1", "123456").await;

        assert!(ledger.consume_if_matches("d1", "123456").await);
        assert!(!ledger.consume_if_matches("d1", "123456").await);
        assert!(!ledger.matches("d1", "123456").await);
    }

    #[tokio::test]
    async fn consuming_a_stale_code_leaves_the_newer_one() {
        let ledger = PairingLedger::new();
        ledger.put("d1", "111111").await;
        ledger.put("d1", "222222").await;

        // A claim that validated the old code must not discard the new one.
        assert!(!ledger.consume_if_matches("d1", "111111").await);
        assert!(ledger.matches("d1", "222222").await);

        assert!(!ledger.consume_if_matches("d1", "999999").await);
        assert!(ledger.consume_if_matches("d1", "222222").await);
    }

    #[tokio::test]
    async fn matches_requires_exact_code() {
        let ledger = PairingLedger::new();
        ledger.put("d1", "123456").await;

        assert!(!ledger.matches("d1", "654321").await);
        assert!(!ledger.matches("d2", "123456").await);
    }
}
