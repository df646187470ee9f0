use serde::{Deserialize, Serialize};
use tally_types::{Transaction, TransactionId};

/// The complete persisted state for one identity.
///
/// Counterparties are kept in insertion order (display order) and
/// transactions in append order (history order). The ledger exposes only
/// read access; every change goes through [`crate::LedgerMutator`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub(crate) counterparties: Vec<String>,
    #[serde(default)]
    pub(crate) transactions: Vec<Transaction>,
    #[serde(default)]
    pub(crate) next_transaction_id: TransactionId,
}

impl Ledger {
    /// An empty ledger, as created on first access by a new identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counterparty names in display order.
    pub fn counterparties(&self) -> &[String] {
        &self.counterparties
    }

    /// All transactions in history order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The id the next recorded transaction will receive.
    pub fn next_transaction_id(&self) -> TransactionId {
        self.next_transaction_id
    }

    /// Exact, case-sensitive membership test.
    pub fn has_counterparty(&self, name: &str) -> bool {
        self.counterparties.iter().any(|c| c == name)
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id() == id)
    }

    /// Current history position of the transaction with `id`.
    pub fn position_of(&self, id: TransactionId) -> Option<usize> {
        self.transactions.iter().position(|t| t.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.counterparties.is_empty() && self.transactions.is_empty()
    }

    /// Raise the id counter above every id present.
    ///
    /// Documents written without a counter (or with a stale one) would
    /// otherwise hand out ids that collide with stored transactions.
    pub(crate) fn reconcile_id_counter(&mut self) {
        if let Some(max) = self.transactions.iter().map(Transaction::id).max() {
            if max >= self.next_transaction_id {
                self.next_transaction_id = max.next();
            }
        }
    }

    pub(crate) fn allocate_id(&mut self) -> TransactionId {
        let id = self.next_transaction_id;
        self.next_transaction_id = id.next();
        id
    }
}
