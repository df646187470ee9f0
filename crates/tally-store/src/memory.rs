//! In-memory ledger store for testing and ephemeral use.
//!
//! [`InMemoryLedgerStore`] keeps every ledger in a `HashMap` protected by a
//! `RwLock`. It can be switched offline to exercise failure paths of the
//! layers above it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use tally_ledger::Ledger;
use tally_types::IdentityKey;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::LedgerStore;

/// An in-memory implementation of [`LedgerStore`].
///
/// Data is lost when the store is dropped.
pub struct InMemoryLedgerStore {
    ledgers: RwLock<HashMap<IdentityKey, Ledger>>,
    online: AtomicBool,
    saves: AtomicU64,
}

impl InMemoryLedgerStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            ledgers: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
            saves: AtomicU64::new(0),
        }
    }

    /// Create a store pre-populated with one ledger.
    pub fn with_ledger(identity: IdentityKey, ledger: Ledger) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.ledgers.write() {
            map.insert(identity, ledger);
        }
        store
    }

    /// Toggle availability. While offline every operation fails with
    /// [`StoreError::Unavailable`].
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of successful saves since creation.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    /// Snapshot of the stored document, bypassing availability.
    pub fn stored(&self, identity: &IdentityKey) -> Option<Ledger> {
        self.ledgers.read().ok()?.get(identity).cloned()
    }

    fn ensure_online(&self) -> StoreResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::unavailable("in-memory store is offline"))
        }
    }
}

impl Default for InMemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn load(&self, identity: &IdentityKey) -> StoreResult<Ledger> {
        self.ensure_online()?;
        let map = self
            .ledgers
            .read()
            .map_err(|e| StoreError::unavailable(format!("lock poisoned: {e}")))?;
        let ledger = map.get(identity).cloned().unwrap_or_default();
        debug!(%identity, transactions = ledger.transactions().len(), "loaded ledger from memory");
        Ok(ledger)
    }

    async fn save(&self, identity: &IdentityKey, ledger: &Ledger) -> StoreResult<()> {
        self.ensure_online()?;
        let mut map = self
            .ledgers
            .write()
            .map_err(|e| StoreError::unavailable(format!("lock poisoned: {e}")))?;
        map.insert(identity.clone(), ledger.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

impl std::fmt::Debug for InMemoryLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.ledgers.read().map(|m| m.len()).unwrap_or(0);
        f.debug_struct("InMemoryLedgerStore")
            .field("ledger_count", &count)
            .field("online", &self.online.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tally_ledger::LedgerMutator;
    use tally_types::Payer;

    fn key(raw: &str) -> IdentityKey {
        IdentityKey::new(raw).unwrap()
    }

    fn sample_ledger() -> Ledger {
        let mut m = LedgerMutator::default();
        m.add_counterparty("Alex").unwrap();
        m.add_transaction("Alex", dec!(12), Payer::Me, Some("pizza".into()))
            .unwrap();
        m.into_ledger()
    }

    #[tokio::test]
    async fn unknown_identity_loads_empty_ledger() {
        let store = InMemoryLedgerStore::new();
        let ledger = store.load(&key("nobody")).await.unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = InMemoryLedgerStore::new();
        let ledger = sample_ledger();
        store.save(&key("u1"), &ledger).await.unwrap();

        assert_eq!(store.load(&key("u1")).await.unwrap(), ledger);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn identities_are_isolated() {
        let store = InMemoryLedgerStore::new();
        store.save(&key("u1"), &sample_ledger()).await.unwrap();
        assert!(store.load(&key("u2")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_store_fails_and_keeps_document() {
        let ledger = sample_ledger();
        let store = InMemoryLedgerStore::with_ledger(key("u1"), ledger.clone());
        store.set_online(false);

        let err = store.load(&key("u1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
        let err = store.save(&key("u1"), &Ledger::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
        assert_eq!(store.save_count(), 0);
        assert_eq!(store.stored(&key("u1")), Some(ledger.clone()));

        store.set_online(true);
        assert_eq!(store.load(&key("u1")).await.unwrap(), ledger);
    }

    #[test]
    fn backend_name_and_debug() {
        let store = InMemoryLedgerStore::new();
        assert_eq!(store.backend_name(), "memory");
        assert!(format!("{store:?}").contains("ledger_count"));
    }
}
