//! Foundation types for Tally.
//!
//! This crate provides the identity and record types shared by every other
//! Tally crate. It carries no business rules: balances and mutations live in
//! `tally-ledger`.
//!
//! # Key Types
//!
//! - [`IdentityKey`] - Opaque, stable key handed over by the identity provider
//! - [`Identity`] - An identity key paired with its display name
//! - [`TransactionId`] - Stable per-ledger transaction identifier
//! - [`Payer`] - Who advanced the money in a transaction
//! - [`Transaction`] - Immutable record of one exchange with a counterparty

pub mod error;
pub mod identity;
pub mod transaction;

pub use error::TypeError;
pub use identity::{Identity, IdentityKey};
pub use transaction::{Payer, Transaction, TransactionId};
