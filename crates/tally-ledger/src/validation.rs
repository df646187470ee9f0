use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Serialize;
use tally_types::TransactionId;

use crate::ledger::Ledger;

/// Result of ledger validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub counterparty_count: usize,
    pub transaction_count: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of transactions that reference a missing counterparty.
    pub fn orphan_count(&self) -> usize {
        self.violations
            .iter()
            .filter(|v| v.kind == ViolationKind::OrphanTransaction)
            .count()
    }
}

/// A specific invariant violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub transaction: Option<TransactionId>,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    BlankCounterparty,
    DuplicateCounterparty,
    OrphanTransaction,
    NonPositiveAmount,
    DuplicateTransactionId,
    IdBeyondCounter,
}

/// Invariant checker for ledgers read back from storage.
///
/// The mutator upholds these invariants for everything it writes; the
/// validator exists for documents produced elsewhere.
pub struct LedgerValidator;

impl LedgerValidator {
    pub fn validate(ledger: &Ledger) -> ValidationReport {
        let mut violations = Vec::new();

        let mut names = HashSet::new();
        for name in ledger.counterparties() {
            if name.trim().is_empty() {
                violations.push(Violation {
                    kind: ViolationKind::BlankCounterparty,
                    transaction: None,
                    description: "blank counterparty name".into(),
                });
            }
            if !names.insert(name.as_str()) {
                violations.push(Violation {
                    kind: ViolationKind::DuplicateCounterparty,
                    transaction: None,
                    description: format!("counterparty {name:?} listed more than once"),
                });
            }
        }

        let mut ids = HashSet::new();
        for t in ledger.transactions() {
            let id = t.id();

            if !names.contains(t.counterparty()) {
                violations.push(Violation {
                    kind: ViolationKind::OrphanTransaction,
                    transaction: Some(id),
                    description: format!("references missing counterparty {:?}", t.counterparty()),
                });
            }

            if t.amount() <= Decimal::ZERO {
                violations.push(Violation {
                    kind: ViolationKind::NonPositiveAmount,
                    transaction: Some(id),
                    description: format!("amount {} is not positive", t.amount()),
                });
            }

            if !ids.insert(id) {
                violations.push(Violation {
                    kind: ViolationKind::DuplicateTransactionId,
                    transaction: Some(id),
                    description: format!("id {id} used more than once"),
                });
            }

            if id >= ledger.next_transaction_id() {
                violations.push(Violation {
                    kind: ViolationKind::IdBeyondCounter,
                    transaction: Some(id),
                    description: format!(
                        "id {id} is not below the next id {}",
                        ledger.next_transaction_id()
                    ),
                });
            }
        }

        ValidationReport {
            counterparty_count: ledger.counterparties().len(),
            transaction_count: ledger.transactions().len(),
            violations,
        }
    }
}
