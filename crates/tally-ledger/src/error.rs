use rust_decimal::Decimal;
use tally_types::TransactionId;

/// Errors produced by ledger operations.
///
/// Every variant is a rejected operation: the ledger is left exactly as it
/// was before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("counterparty name {name:?} is empty or already present")]
    DuplicateCounterparty { name: String },

    #[error("unknown counterparty: {name}")]
    UnknownCounterparty { name: String },

    #[error("invalid amount {input:?}: {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("transaction index {index} out of range (ledger holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("transaction {id} not found")]
    TransactionNotFound { id: TransactionId },

    #[error("balance with {name} is not settled ({balance})")]
    BalanceNotSettled { name: String, balance: Decimal },
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
