use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Stable identifier of a transaction within one ledger.
///
/// Ids are assigned from a monotonically increasing per-ledger counter at
/// creation time and are never reused, so addressing a transaction by id
/// does not shift when other transactions are removed.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(u64);

impl TransactionId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id that follows this one.
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for TransactionId {
    type Err = TypeError;

    /// Accepts both `12` and `#12`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().strip_prefix('#').unwrap_or(s.trim());
        digits
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidTransactionId(s.to_string()))
    }
}

/// Who advanced the money in a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payer {
    /// The ledger owner paid; the counterparty owes it back.
    Me,
    /// The counterparty paid; the ledger owner owes it back.
    Counterparty,
}

impl fmt::Display for Payer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Me => write!(f, "me"),
            Self::Counterparty => write!(f, "counterparty"),
        }
    }
}

impl FromStr for Payer {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "me" | "i" | "self" => Ok(Self::Me),
            "counterparty" | "them" | "they" => Ok(Self::Counterparty),
            _ => Err(TypeError::InvalidPayer(s.to_string())),
        }
    }
}

/// One recorded exchange between the ledger owner and a counterparty.
///
/// Transactions are immutable once created. The amount is always a
/// positive magnitude; direction is carried by [`Payer`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    counterparty: String,
    amount: Decimal,
    payer: Payer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Build a transaction record. Amount validation belongs to the ledger
    /// mutator; this constructor only normalizes blank notes to `None`.
    pub fn new(
        id: TransactionId,
        counterparty: impl Into<String>,
        amount: Decimal,
        payer: Payer,
        note: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Self {
            id,
            counterparty: counterparty.into(),
            amount,
            payer,
            note,
            timestamp,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn counterparty(&self) -> &str {
        &self.counterparty
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn payer(&self) -> Payer {
        self.payer
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Signed contribution to the counterparty's balance: positive when the
    /// owner paid, negative when the counterparty paid.
    pub fn signed_amount(&self) -> Decimal {
        match self.payer {
            Payer::Me => self.amount,
            Payer::Counterparty => -self.amount,
        }
    }

    /// Returns `true` if this transaction references `name`.
    pub fn is_with(&self, name: &str) -> bool {
        self.counterparty == name
    }
}
