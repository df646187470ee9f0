use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tally_types::Transaction;

use crate::ledger::Ledger;

/// A transaction paired with its current history position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexedTransaction<'a> {
    pub index: usize,
    pub transaction: &'a Transaction,
}

/// Per-counterparty row for overview screens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CounterpartySummary {
    pub name: String,
    pub balance: Decimal,
    pub transaction_count: usize,
}

/// Classification of a signed balance.
///
/// Positive balances mean the counterparty owes the ledger owner; negative
/// balances mean the owner owes the counterparty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "amount", rename_all = "snake_case")]
pub enum Standing {
    Settled,
    TheyOwe(Decimal),
    YouOwe(Decimal),
}

impl Standing {
    pub fn from_balance(balance: Decimal) -> Self {
        if balance.is_zero() {
            Self::Settled
        } else if balance.is_sign_positive() {
            Self::TheyOwe(balance)
        } else {
            Self::YouOwe(-balance)
        }
    }

    /// Phrase the standing with a single counterparty.
    pub fn describe(&self, name: &str, symbol: &str) -> String {
        match self {
            Self::Settled => "All settled".to_string(),
            Self::TheyOwe(amount) => format!("{name} owes you {symbol}{amount}"),
            Self::YouOwe(amount) => format!("You owe {name} {symbol}{amount}"),
        }
    }

    /// Phrase the aggregate standing across all counterparties.
    pub fn describe_overall(&self, symbol: &str) -> String {
        match self {
            Self::Settled => "All settled up".to_string(),
            Self::TheyOwe(amount) => format!("You will get {symbol}{amount}"),
            Self::YouOwe(amount) => format!("You will give {symbol}{amount}"),
        }
    }
}

impl fmt::Display for Standing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe_overall(""))
    }
}

/// Pure balance queries over a ledger snapshot.
///
/// None of these fail: unknown counterparties yield zero balances and empty
/// transaction lists.
pub struct BalanceEngine;

impl BalanceEngine {
    /// Net balance with `name`: what the owner advanced minus what the
    /// counterparty advanced.
    pub fn balance_of(ledger: &Ledger, name: &str) -> Decimal {
        ledger
            .transactions()
            .iter()
            .filter(|t| t.is_with(name))
            .map(Transaction::signed_amount)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Net settlement position across every counterparty in the ledger.
    ///
    /// Orphaned transactions (whose counterparty is gone) do not count.
    /// Sums saturate at the `Decimal` bounds instead of panicking.
    pub fn aggregate_balance(ledger: &Ledger) -> Decimal {
        ledger
            .counterparties()
            .iter()
            .map(|name| Self::balance_of(ledger, name))
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Transactions with `name` in history order, with their positions.
    pub fn transactions_for<'a>(ledger: &'a Ledger, name: &str) -> Vec<IndexedTransaction<'a>> {
        ledger
            .transactions()
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_with(name))
            .map(|(index, transaction)| IndexedTransaction { index, transaction })
            .collect()
    }

    pub fn standing_with(ledger: &Ledger, name: &str) -> Standing {
        Standing::from_balance(Self::balance_of(ledger, name))
    }

    pub fn overall(ledger: &Ledger) -> Standing {
        Standing::from_balance(Self::aggregate_balance(ledger))
    }

    /// One summary row per counterparty, in display order.
    pub fn summaries(ledger: &Ledger) -> Vec<CounterpartySummary> {
        ledger
            .counterparties()
            .iter()
            .map(|name| {
                let rows = Self::transactions_for(ledger, name);
                CounterpartySummary {
                    name: name.clone(),
                    balance: rows
                        .iter()
                        .map(|r| r.transaction.signed_amount())
                        .fold(Decimal::ZERO, Decimal::saturating_add),
                    transaction_count: rows.len(),
                }
            })
            .collect()
    }
}
