use std::sync::Arc;

use rust_decimal::Decimal;
use tally_ledger::{
    parse_amount, BalanceEngine, CounterpartySummary, IndexedTransaction, Ledger, LedgerMutator,
    LedgerValidator, Standing, ValidationReport,
};
use tally_store::LedgerStore;
use tally_types::{Identity, Payer, Transaction, TransactionId};
use tracing::{debug, info, warn};

use crate::config::TallyConfig;
use crate::error::{SessionError, SessionResult};

/// One identity's ledger, bound to the store it is persisted in.
///
/// A session starts unloaded. Until [`load`](Self::load) succeeds every
/// mutation and every save fails with [`SessionError::NotLoaded`], so an
/// empty in-memory ledger can never overwrite a stored one.
///
/// Each successful mutation is followed by a save of the whole ledger. When
/// that save fails the mutation is kept in memory, the error is returned and
/// the session stays dirty until a later save (the next mutation, or
/// [`sync`](Self::sync)) succeeds.
pub struct Session {
    identity: Identity,
    store: Arc<dyn LedgerStore>,
    mutator: Option<LedgerMutator>,
    dirty: bool,
}

impl Session {
    /// Bind `identity` to `store` without touching the store.
    pub fn new(identity: Identity, store: Arc<dyn LedgerStore>) -> Self {
        Self {
            identity,
            store,
            mutator: None,
            dirty: false,
        }
    }

    /// Bind and load in one step.
    pub async fn open(identity: Identity, store: Arc<dyn LedgerStore>) -> SessionResult<Self> {
        let mut session = Self::new(identity, store);
        session.load().await?;
        Ok(session)
    }

    /// Open the store and identity named by `config`, then load.
    pub async fn from_config(config: &TallyConfig) -> SessionResult<Self> {
        Self::open(config.identity()?, config.store.open()).await
    }

    /// Fetch the identity's ledger from the store, replacing whatever this
    /// session held. Returns the validation report of the loaded document.
    ///
    /// On failure the session keeps its previous state (unloaded, for a
    /// fresh session).
    pub async fn load(&mut self) -> SessionResult<ValidationReport> {
        if self.dirty {
            warn!(identity = %self.identity.key, "reloading over unsaved changes");
        }
        let ledger = self.store.load(&self.identity.key).await?;

        let report = LedgerValidator::validate(&ledger);
        for violation in &report.violations {
            warn!(
                identity = %self.identity.key,
                kind = ?violation.kind,
                transaction = ?violation.transaction,
                "{}",
                violation.description
            );
        }
        info!(
            identity = %self.identity.key,
            backend = self.store.backend_name(),
            counterparties = report.counterparty_count,
            transactions = report.transaction_count,
            "ledger loaded"
        );

        self.mutator = Some(LedgerMutator::new(ledger));
        self.dirty = false;
        Ok(report)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn is_loaded(&self) -> bool {
        self.mutator.is_some()
    }

    /// `true` when the in-memory ledger holds changes the store has not
    /// accepted yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn ledger(&self) -> SessionResult<&Ledger> {
        self.mutator
            .as_ref()
            .map(LedgerMutator::ledger)
            .ok_or(SessionError::NotLoaded)
    }

    fn mutator_mut(&mut self) -> SessionResult<&mut LedgerMutator> {
        self.mutator.as_mut().ok_or(SessionError::NotLoaded)
    }

    /// Save the in-memory ledger unconditionally.
    pub async fn sync(&mut self) -> SessionResult<()> {
        self.persist().await
    }

    async fn persist(&mut self) -> SessionResult<()> {
        let mutator = self.mutator.as_ref().ok_or(SessionError::NotLoaded)?;
        match self.store.save(&self.identity.key, mutator.ledger()).await {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                self.dirty = true;
                warn!(identity = %self.identity.key, error = %e, "save failed; keeping changes in memory");
                Err(e.into())
            }
        }
    }

    // ---- Mutations ----

    pub async fn add_counterparty(&mut self, name: &str) -> SessionResult<()> {
        self.mutator_mut()?.add_counterparty(name)?;
        self.persist().await
    }

    pub async fn add_transaction(
        &mut self,
        counterparty: &str,
        amount: Decimal,
        payer: Payer,
        note: Option<String>,
    ) -> SessionResult<TransactionId> {
        let id = self
            .mutator_mut()?
            .add_transaction(counterparty, amount, payer, note)?;
        self.persist().await?;
        Ok(id)
    }

    /// Like [`add_transaction`](Self::add_transaction), taking the amount as
    /// the user typed it.
    pub async fn add_transaction_text(
        &mut self,
        counterparty: &str,
        raw_amount: Option<&str>,
        payer: Payer,
        note: Option<String>,
    ) -> SessionResult<TransactionId> {
        // Gate first so an unloaded session reports NotLoaded, not a parse error.
        self.mutator_mut()?;
        let amount = parse_amount(raw_amount)?;
        self.add_transaction(counterparty, amount, payer, note).await
    }

    pub async fn delete_transaction(&mut self, id: TransactionId) -> SessionResult<Transaction> {
        let removed = self.mutator_mut()?.delete_transaction(id)?;
        self.persist().await?;
        Ok(removed)
    }

    pub async fn delete_transaction_at(&mut self, index: usize) -> SessionResult<Transaction> {
        let removed = self.mutator_mut()?.delete_transaction_at(index)?;
        self.persist().await?;
        Ok(removed)
    }

    /// Restore the most recently deleted transaction. Nothing is saved when
    /// there was nothing to undo.
    pub async fn undo_last_delete(&mut self) -> SessionResult<Option<TransactionId>> {
        let restored = self.mutator_mut()?.undo_last_delete();
        if restored.is_some() {
            self.persist().await?;
        } else {
            debug!(identity = %self.identity.key, "nothing to undo");
        }
        Ok(restored)
    }

    /// Remove a settled counterparty and its history. Returns how many
    /// transactions went with it.
    pub async fn delete_counterparty(&mut self, name: &str) -> SessionResult<usize> {
        let removed = self.mutator_mut()?.delete_counterparty(name)?;
        self.persist().await?;
        Ok(removed)
    }

    pub async fn prune_orphans(&mut self) -> SessionResult<usize> {
        let removed = self.mutator_mut()?.prune_orphans();
        if removed > 0 {
            self.persist().await?;
        }
        Ok(removed)
    }

    // ---- Queries ----

    pub fn balance_of(&self, name: &str) -> SessionResult<Decimal> {
        Ok(BalanceEngine::balance_of(self.ledger()?, name))
    }

    pub fn aggregate_balance(&self) -> SessionResult<Decimal> {
        Ok(BalanceEngine::aggregate_balance(self.ledger()?))
    }

    pub fn transactions_for(&self, name: &str) -> SessionResult<Vec<IndexedTransaction<'_>>> {
        Ok(BalanceEngine::transactions_for(self.ledger()?, name))
    }

    pub fn standing_with(&self, name: &str) -> SessionResult<Standing> {
        Ok(BalanceEngine::standing_with(self.ledger()?, name))
    }

    pub fn overall(&self) -> SessionResult<Standing> {
        Ok(BalanceEngine::overall(self.ledger()?))
    }

    pub fn summaries(&self) -> SessionResult<Vec<CounterpartySummary>> {
        Ok(BalanceEngine::summaries(self.ledger()?))
    }

    pub fn verify(&self) -> SessionResult<ValidationReport> {
        Ok(LedgerValidator::validate(self.ledger()?))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("identity", &self.identity.key)
            .field("backend", &self.store.backend_name())
            .field("loaded", &self.is_loaded())
            .field("dirty", &self.dirty)
            .finish()
    }
}
