use chrono::Utc;
use rust_decimal::Decimal;
use tally_types::{Payer, Transaction, TransactionId};
use tracing::{debug, info};

use crate::amount::ensure_positive;
use crate::balance::BalanceEngine;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::Ledger;

/// The most recently deleted transaction and where it used to sit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletedTransaction {
    pub transaction: Transaction,
    pub index: usize,
}

/// Sole writer of a [`Ledger`].
///
/// Every operation either applies completely or returns an error and leaves
/// the ledger untouched. Destructive operations assume the caller already
/// obtained the user's confirmation.
#[derive(Clone, Debug, Default)]
pub struct LedgerMutator {
    ledger: Ledger,
    undo: Option<DeletedTransaction>,
}

impl LedgerMutator {
    pub fn new(mut ledger: Ledger) -> Self {
        ledger.reconcile_id_counter();
        Self { ledger, undo: None }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    /// The deletion `undo_last_delete` would restore, if any.
    pub fn pending_undo(&self) -> Option<&DeletedTransaction> {
        self.undo.as_ref()
    }

    /// Register a new counterparty at the end of the display order.
    ///
    /// Names are stored exactly as given and compared exactly everywhere.
    /// Blank names and exact (case-sensitive) duplicates are rejected.
    pub fn add_counterparty(&mut self, name: &str) -> LedgerResult<()> {
        if name.trim().is_empty() || self.ledger.has_counterparty(name) {
            return Err(LedgerError::DuplicateCounterparty {
                name: name.to_string(),
            });
        }

        self.ledger.counterparties.push(name.to_string());
        info!(counterparty = name, "added counterparty");
        Ok(())
    }

    /// Append a transaction with `counterparty`, timestamped now.
    pub fn add_transaction(
        &mut self,
        counterparty: &str,
        amount: Decimal,
        payer: Payer,
        note: Option<String>,
    ) -> LedgerResult<TransactionId> {
        if !self.ledger.has_counterparty(counterparty) {
            return Err(LedgerError::UnknownCounterparty {
                name: counterparty.to_string(),
            });
        }
        let amount = ensure_positive(amount)?;
        self.ensure_representable(counterparty, amount, payer)?;

        let id = self.ledger.allocate_id();
        let transaction = Transaction::new(id, counterparty, amount, payer, note, Utc::now());
        self.ledger.transactions.push(transaction);
        info!(%id, counterparty, %amount, %payer, "recorded transaction");
        Ok(id)
    }

    /// Reject a transaction whose balance or aggregate would leave the
    /// `Decimal` range.
    fn ensure_representable(
        &self,
        counterparty: &str,
        amount: Decimal,
        payer: Payer,
    ) -> LedgerResult<()> {
        let apply = |total: Decimal| match payer {
            Payer::Me => total.checked_add(amount),
            Payer::Counterparty => total.checked_sub(amount),
        };
        let balance = apply(BalanceEngine::balance_of(&self.ledger, counterparty));
        let aggregate = apply(BalanceEngine::aggregate_balance(&self.ledger));
        if balance.is_none() || aggregate.is_none() {
            return Err(LedgerError::InvalidAmount {
                input: amount.to_string(),
                reason: "balance would exceed the supported range".to_string(),
            });
        }
        Ok(())
    }

    /// Remove the transaction with `id`, keeping it in the undo slot.
    pub fn delete_transaction(&mut self, id: TransactionId) -> LedgerResult<Transaction> {
        let index = self
            .ledger
            .position_of(id)
            .ok_or(LedgerError::TransactionNotFound { id })?;
        Ok(self.remove_at(index))
    }

    /// Remove the transaction at history position `index`, keeping it in
    /// the undo slot.
    pub fn delete_transaction_at(&mut self, index: usize) -> LedgerResult<Transaction> {
        let len = self.ledger.transactions.len();
        if index >= len {
            return Err(LedgerError::IndexOutOfRange { index, len });
        }
        Ok(self.remove_at(index))
    }

    fn remove_at(&mut self, index: usize) -> Transaction {
        let transaction = self.ledger.transactions.remove(index);
        info!(id = %transaction.id(), index, "deleted transaction");
        self.undo = Some(DeletedTransaction {
            transaction: transaction.clone(),
            index,
        });
        transaction
    }

    /// Restore the most recently deleted transaction.
    ///
    /// Reinserts at the original position, or at the end if the history has
    /// since shrunk below it. Returns `None` when there is nothing to undo.
    pub fn undo_last_delete(&mut self) -> Option<TransactionId> {
        let DeletedTransaction { transaction, index } = self.undo.take()?;
        let id = transaction.id();
        let at = index.min(self.ledger.transactions.len());
        if at != index {
            debug!(%id, index, clamped = at, "undo position clamped to end of history");
        }
        self.ledger.transactions.insert(at, transaction);
        info!(%id, index = at, "restored deleted transaction");
        Some(id)
    }

    /// Remove a settled counterparty together with all of its transactions.
    ///
    /// Returns the number of transactions removed by the cascade.
    pub fn delete_counterparty(&mut self, name: &str) -> LedgerResult<usize> {
        let Some(position) = self.ledger.counterparties.iter().position(|c| c == name) else {
            return Err(LedgerError::UnknownCounterparty {
                name: name.to_string(),
            });
        };

        let balance = BalanceEngine::balance_of(&self.ledger, name);
        if !balance.is_zero() {
            return Err(LedgerError::BalanceNotSettled {
                name: name.to_string(),
                balance,
            });
        }

        self.ledger.counterparties.remove(position);
        let removed = self.remove_transactions_with(name);
        if self
            .undo
            .as_ref()
            .is_some_and(|d| d.transaction.is_with(name))
        {
            self.undo = None;
        }
        info!(counterparty = name, removed, "deleted counterparty");
        Ok(removed)
    }

    /// Drop transactions whose counterparty is no longer registered.
    pub fn prune_orphans(&mut self) -> usize {
        let before = self.ledger.transactions.len();
        let ledger = &mut self.ledger;
        let known = ledger.counterparties.clone();
        ledger
            .transactions
            .retain(|t| known.iter().any(|c| t.is_with(c)));
        let pruned = before - ledger.transactions.len();
        if pruned > 0 {
            info!(pruned, "pruned orphaned transactions");
        }
        pruned
    }

    fn remove_transactions_with(&mut self, name: &str) -> usize {
        let before = self.ledger.transactions.len();
        self.ledger.transactions.retain(|t| !t.is_with(name));
        before - self.ledger.transactions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn with_alex() -> LedgerMutator {
        let mut m = LedgerMutator::default();
        m.add_counterparty("Alex").unwrap();
        m
    }

    #[test]
    fn add_counterparty_appends_in_order() {
        let mut m = LedgerMutator::default();
        m.add_counterparty("Alex").unwrap();
        m.add_counterparty("Sam").unwrap();
        assert_eq!(m.ledger().counterparties(), ["Alex".to_string(), "Sam".to_string()]);
    }

    #[test]
    fn duplicate_counterparty_is_rejected_without_change() {
        let mut m = with_alex();
        let before = m.ledger().clone();
        let err = m.add_counterparty("Alex").unwrap_err();
        assert_eq!(err, LedgerError::DuplicateCounterparty { name: "Alex".into() });
        assert_eq!(m.ledger(), &before);
    }

    #[test]
    fn counterparty_names_are_case_sensitive() {
        let mut m = with_alex();
        m.add_counterparty("alex").unwrap();
        assert_eq!(m.ledger().counterparties().len(), 2);
    }

    #[test]
    fn blank_counterparty_is_rejected() {
        let mut m = LedgerMutator::default();
        assert!(matches!(
            m.add_counterparty("   "),
            Err(LedgerError::DuplicateCounterparty { .. })
        ));
        assert!(m.ledger().is_empty());
    }

    #[test]
    fn names_are_kept_verbatim_and_matched_exactly() {
        let mut m = with_alex();
        m.add_counterparty(" Alex").unwrap();
        m.add_counterparty(" Sam ").unwrap();
        assert_eq!(m.ledger().counterparties(), ["Alex", " Alex", " Sam "]);

        m.add_transaction(" Sam ", dec!(5), Payer::Me, None).unwrap();
        assert!(matches!(
            m.add_transaction("Sam", dec!(5), Payer::Me, None),
            Err(LedgerError::UnknownCounterparty { .. })
        ));
        assert_eq!(BalanceEngine::balance_of(m.ledger(), " Sam "), dec!(5));
    }

    #[test]
    fn transaction_that_would_overflow_balance_is_rejected() {
        let huge = Decimal::from_str("50000000000000000000000000000").unwrap();
        let mut m = with_alex();
        m.add_transaction("Alex", huge, Payer::Me, None).unwrap();
        let before = m.ledger().clone();

        let err = m.add_transaction("Alex", huge, Payer::Me, None).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
        assert_eq!(m.ledger(), &before);

        assert_eq!(BalanceEngine::balance_of(m.ledger(), "Alex"), huge);
        m.add_transaction("Alex", huge, Payer::Counterparty, None).unwrap();
        m.delete_counterparty("Alex").unwrap();
    }

    #[test]
    fn transaction_that_would_overflow_aggregate_is_rejected() {
        let huge = Decimal::from_str("50000000000000000000000000000").unwrap();
        let mut m = with_alex();
        m.add_counterparty("Sam").unwrap();
        m.add_transaction("Alex", huge, Payer::Counterparty, None).unwrap();

        let err = m
            .add_transaction("Sam", huge, Payer::Counterparty, None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
        assert!(BalanceEngine::transactions_for(m.ledger(), "Sam").is_empty());
    }

    #[test]
    fn add_transaction_requires_known_counterparty() {
        let mut m = with_alex();
        let err = m
            .add_transaction("Sam", dec!(5), Payer::Me, None)
            .unwrap_err();
        assert_eq!(err, LedgerError::UnknownCounterparty { name: "Sam".into() });
        assert!(m.ledger().transactions().is_empty());
    }

    #[test]
    fn unknown_counterparty_is_reported_before_bad_amount() {
        let mut m = with_alex();
        let err = m
            .add_transaction("Sam", dec!(-1), Payer::Me, None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::UnknownCounterparty { .. }));
    }

    #[test]
    fn add_transaction_rejects_non_positive_amounts() {
        let mut m = with_alex();
        for amount in [dec!(0), dec!(-3)] {
            let err = m
                .add_transaction("Alex", amount, Payer::Me, None)
                .unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAmount { .. }));
        }
        assert!(m.ledger().transactions().is_empty());
        assert_eq!(m.ledger().next_transaction_id(), TransactionId::new(0));
    }

    #[test]
    fn transactions_get_increasing_ids() {
        let mut m = with_alex();
        let a = m.add_transaction("Alex", dec!(1), Payer::Me, None).unwrap();
        let b = m.add_transaction("Alex", dec!(2), Payer::Me, None).unwrap();
        assert!(b > a);
        let stored = m.ledger().transaction(b).unwrap();
        assert_eq!(stored.amount(), dec!(2));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut m = with_alex();
        let a = m.add_transaction("Alex", dec!(1), Payer::Me, None).unwrap();
        m.delete_transaction(a).unwrap();
        let b = m.add_transaction("Alex", dec!(1), Payer::Me, None).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn delete_by_index_out_of_range() {
        let mut m = with_alex();
        m.add_transaction("Alex", dec!(1), Payer::Me, None).unwrap();
        let err = m.delete_transaction_at(1).unwrap_err();
        assert_eq!(err, LedgerError::IndexOutOfRange { index: 1, len: 1 });
        assert_eq!(m.ledger().transactions().len(), 1);
        assert!(m.pending_undo().is_none());
    }

    #[test]
    fn delete_by_unknown_id() {
        let mut m = with_alex();
        let err = m.delete_transaction(TransactionId::new(99)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::TransactionNotFound {
                id: TransactionId::new(99)
            }
        );
    }

    #[test]
    fn undo_restores_exact_sequence() {
        let mut m = with_alex();
        m.add_counterparty("Sam").unwrap();
        m.add_transaction("Alex", dec!(1), Payer::Me, None).unwrap();
        let middle = m.add_transaction("Sam", dec!(2), Payer::Counterparty, None).unwrap();
        m.add_transaction("Alex", dec!(3), Payer::Me, None).unwrap();
        let before = m.ledger().clone();

        let removed = m.delete_transaction(middle).unwrap();
        assert_eq!(removed.id(), middle);
        assert_eq!(m.ledger().transactions().len(), 2);

        assert_eq!(m.undo_last_delete(), Some(middle));
        assert_eq!(m.ledger(), &before);
        assert!(m.pending_undo().is_none());
    }

    #[test]
    fn undo_with_empty_buffer_is_noop() {
        let mut m = with_alex();
        m.add_transaction("Alex", dec!(1), Payer::Me, None).unwrap();
        let before = m.ledger().clone();
        assert_eq!(m.undo_last_delete(), None);
        assert_eq!(m.ledger(), &before);
    }

    #[test]
    fn undo_only_keeps_latest_delete() {
        let mut m = with_alex();
        let a = m.add_transaction("Alex", dec!(1), Payer::Me, None).unwrap();
        let b = m.add_transaction("Alex", dec!(2), Payer::Me, None).unwrap();
        m.delete_transaction(a).unwrap();
        m.delete_transaction(b).unwrap();

        assert_eq!(m.undo_last_delete(), Some(b));
        assert_eq!(m.undo_last_delete(), None);
        assert!(m.ledger().transaction(a).is_none());
    }

    #[test]
    fn undo_clamps_to_end_when_history_shrank() {
        let mut m = with_alex();
        m.add_counterparty("Sam").unwrap();
        m.add_transaction("Sam", dec!(1), Payer::Me, None).unwrap();
        m.add_transaction("Sam", dec!(1), Payer::Counterparty, None).unwrap();
        let last = m.add_transaction("Alex", dec!(5), Payer::Me, None).unwrap();

        m.delete_transaction_at(2).unwrap();
        m.delete_counterparty("Sam").unwrap();
        assert!(m.ledger().transactions().is_empty());

        assert_eq!(m.undo_last_delete(), Some(last));
        assert_eq!(m.ledger().position_of(last), Some(0));
    }

    #[test]
    fn delete_counterparty_requires_settlement() {
        let mut m = with_alex();
        m.add_transaction("Alex", dec!(20), Payer::Me, None).unwrap();
        let before = m.ledger().clone();
        let err = m.delete_counterparty("Alex").unwrap_err();
        assert_eq!(
            err,
            LedgerError::BalanceNotSettled {
                name: "Alex".into(),
                balance: dec!(20)
            }
        );
        assert_eq!(m.ledger(), &before);
    }

    #[test]
    fn delete_unknown_counterparty() {
        let mut m = with_alex();
        assert!(matches!(
            m.delete_counterparty("Sam"),
            Err(LedgerError::UnknownCounterparty { .. })
        ));
    }

    #[test]
    fn delete_counterparty_clears_matching_undo_slot() {
        let mut m = with_alex();
        let t = m.add_transaction("Alex", dec!(4), Payer::Me, None).unwrap();
        m.delete_transaction(t).unwrap();
        m.delete_counterparty("Alex").unwrap();

        assert!(m.pending_undo().is_none());
        assert_eq!(m.undo_last_delete(), None);
        assert!(m.ledger().transactions().is_empty());
    }

    #[test]
    fn delete_counterparty_keeps_unrelated_undo_slot() {
        let mut m = with_alex();
        m.add_counterparty("Sam").unwrap();
        let t = m.add_transaction("Sam", dec!(4), Payer::Me, None).unwrap();
        m.delete_transaction(t).unwrap();
        m.delete_counterparty("Alex").unwrap();
        assert_eq!(m.undo_last_delete(), Some(t));
    }

    #[test]
    fn alex_settlement_scenario() {
        let mut m = with_alex();
        m.add_counterparty("Sam").unwrap();
        m.add_transaction("Sam", dec!(9), Payer::Me, None).unwrap();

        m.add_transaction("Alex", dec!(20), Payer::Me, Some("lunch".into()))
            .unwrap();
        assert_eq!(BalanceEngine::balance_of(m.ledger(), "Alex"), dec!(20));

        m.add_transaction("Alex", dec!(5), Payer::Counterparty, None).unwrap();
        assert_eq!(BalanceEngine::balance_of(m.ledger(), "Alex"), dec!(15));

        assert!(matches!(
            m.delete_counterparty("Alex"),
            Err(LedgerError::BalanceNotSettled { .. })
        ));

        m.add_transaction("Alex", dec!(15), Payer::Counterparty, None).unwrap();
        assert_eq!(BalanceEngine::balance_of(m.ledger(), "Alex"), Decimal::ZERO);

        assert_eq!(m.delete_counterparty("Alex").unwrap(), 3);
        assert!(!m.ledger().has_counterparty("Alex"));
        assert!(m.ledger().transactions().iter().all(|t| !t.is_with("Alex")));
        assert_eq!(m.ledger().transactions().len(), 1);
    }

    #[test]
    fn new_reconciles_id_counter() {
        let mut seed = with_alex();
        seed.add_transaction("Alex", dec!(1), Payer::Me, None).unwrap();
        seed.add_transaction("Alex", dec!(1), Payer::Me, None).unwrap();
        let mut ledger = seed.into_ledger();
        ledger.next_transaction_id = TransactionId::new(0);

        let mut m = LedgerMutator::new(ledger);
        let id = m.add_transaction("Alex", dec!(1), Payer::Me, None).unwrap();
        assert_eq!(id, TransactionId::new(2));
    }

    #[test]
    fn prune_orphans_removes_dangling_transactions() {
        let mut seed = with_alex();
        seed.add_counterparty("Sam").unwrap();
        seed.add_transaction("Alex", dec!(1), Payer::Me, None).unwrap();
        seed.add_transaction("Sam", dec!(1), Payer::Me, None).unwrap();
        let mut ledger = seed.into_ledger();
        ledger.counterparties.retain(|c| c != "Sam");

        let mut m = LedgerMutator::new(ledger);
        assert_eq!(m.prune_orphans(), 1);
        assert_eq!(m.prune_orphans(), 0);
        assert!(m.ledger().transactions().iter().all(|t| t.is_with("Alex")));
    }
}
