use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("identity key must not be empty")]
    EmptyIdentityKey,

    #[error("invalid transaction id: {0}")]
    InvalidTransactionId(String),

    #[error("invalid payer: {0}")]
    InvalidPayer(String),
}
