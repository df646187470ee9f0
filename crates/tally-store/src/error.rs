/// Errors from ledger store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    /// A stored document exists but cannot be decoded.
    #[error("corrupt ledger document for {identity}: {reason}")]
    Corrupt { identity: String, reason: String },

    /// Serialization failure while encoding a ledger.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
