//! Ledger persistence for Tally.
//!
//! The core never talks to a storage technology directly. It goes through
//! the [`LedgerStore`] port, which loads and saves one whole [`Ledger`]
//! document per identity.
//!
//! # Storage Backends
//!
//! - [`InMemoryLedgerStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileLedgerStore`] -- one JSON document per identity under a root directory
//!
//! # Design Rules
//!
//! 1. `load` of an unknown identity yields an empty ledger, never an error.
//! 2. `save` replaces the whole document; a failed save leaves the previous
//!    document intact.
//! 3. Failures are reported, never retried by the store.
//!
//! [`Ledger`]: tally_ledger::Ledger

pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use config::{StoreBackend, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use file::FileLedgerStore;
pub use memory::InMemoryLedgerStore;
pub use traits::LedgerStore;
