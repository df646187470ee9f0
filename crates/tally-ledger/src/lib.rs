//! Ledger core for Tally.
//!
//! This crate is the heart of Tally. It provides:
//! - The [`Ledger`] document: counterparties and transactions for one identity
//! - [`BalanceEngine`] - pure balance and settlement queries
//! - [`LedgerMutator`] - the only writer of a ledger, enforcing its invariants
//! - Single-slot undo of the most recent transaction deletion
//! - [`LedgerValidator`] - invariant checks for documents read from storage

pub mod amount;
pub mod balance;
pub mod error;
pub mod ledger;
pub mod mutator;
pub mod validation;

pub use amount::parse_amount;
pub use balance::{BalanceEngine, CounterpartySummary, IndexedTransaction, Standing};
pub use error::{LedgerError, LedgerResult};
pub use ledger::Ledger;
pub use mutator::{DeletedTransaction, LedgerMutator};
pub use validation::{LedgerValidator, ValidationReport, Violation, ViolationKind};
