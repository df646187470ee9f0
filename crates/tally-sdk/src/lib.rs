//! High-level SDK for Tally.
//!
//! A [`Session`] owns one identity's ledger together with the store it came
//! from. Applications go through it instead of wiring the ledger and store
//! crates together themselves.

pub mod config;
pub mod error;
pub mod session;

pub use config::{IdentityConfig, TallyConfig};
pub use error::{SessionError, SessionResult};
pub use session::Session;

// Re-export key types
pub use tally_ledger::{
    parse_amount, CounterpartySummary, IndexedTransaction, Ledger, LedgerError, Standing,
    ValidationReport, Violation, ViolationKind,
};
pub use tally_store::{
    FileLedgerStore, InMemoryLedgerStore, LedgerStore, StoreBackend, StoreConfig, StoreError,
};
pub use tally_types::{Identity, IdentityKey, Payer, Transaction, TransactionId};
pub use rust_decimal::Decimal;
