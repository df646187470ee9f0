use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("ledger not loaded: it must be loaded before it can be changed or saved")]
    NotLoaded,

    #[error("ledger error: {0}")]
    Ledger(#[from] tally_ledger::LedgerError),

    #[error("store error: {0}")]
    Store(#[from] tally_store::StoreError),

    #[error("invalid identity: {0}")]
    Identity(#[from] tally_types::TypeError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
