use async_trait::async_trait;
use tally_ledger::Ledger;
use tally_types::IdentityKey;

use crate::error::StoreResult;

/// Persistence port for ledgers, one document per identity.
///
/// Implementations must satisfy these rules:
/// - `load` of an identity with no stored document returns an empty ledger.
/// - `save` replaces the identity's document as a whole.
/// - A failed `save` must not leave a partially written document behind.
/// - Failures are returned to the caller and never retried internally.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the ledger owned by `identity`.
    async fn load(&self, identity: &IdentityKey) -> StoreResult<Ledger>;

    /// Persist `ledger` as the complete state owned by `identity`.
    async fn save(&self, identity: &IdentityKey, ledger: &Ledger) -> StoreResult<()>;

    /// Short backend name for logs and status output.
    fn backend_name(&self) -> &'static str;
}
