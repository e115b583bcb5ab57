//! A transaction: an atomic, balanced group of splits.
//!
//! The debit legs live in an ordered owned collection; the single balancing
//! credit leg is embedded in the transaction itself and rewritten from the
//! debit legs after every mutation of the collection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use splitbook_core::{DomainError, DomainResult, Entity, EntityId};

use crate::split::{Reconciled, Split, SplitId};

/// Transaction identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub EntityId);

impl TransactionId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Sentinel "unset" date carried by a freshly constructed transaction.
pub(crate) fn sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default()
}

/// An atomic group of splits whose net monetary value is always zero.
///
/// `debit_splits` is insertion-ordered; the order is observable through the
/// slice accessor and preserved by removal. Direct field writes on a debit
/// leg do not re-balance the credit leg — callers mutating legs outside
/// append/remove must call [`Transaction::recompute_credit`] themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    pub num: String,
    pub description: String,
    pub date: NaiveDate,
    debit_splits: Vec<Split>,
    credit_split: Split,
    debit: bool,
}

impl Transaction {
    pub(crate) fn new(id: TransactionId, credit_id: SplitId) -> Self {
        let mut credit_split = Split::new(credit_id);
        credit_split.set_parent(Some(id));
        Self {
            id,
            num: String::new(),
            description: String::new(),
            date: sentinel_date(),
            debit_splits: Vec::new(),
            credit_split,
            debit: false,
        }
    }

    pub fn id_typed(&self) -> TransactionId {
        self.id
    }

    /// Debit legs in insertion order.
    pub fn debit_splits(&self) -> &[Split] {
        &self.debit_splits
    }

    /// The embedded balancing leg.
    pub fn credit_split(&self) -> &Split {
        &self.credit_split
    }

    /// Number of live debit legs.
    pub fn split_count(&self) -> usize {
        self.debit_splits.len()
    }

    /// Guard flag set by the account collaborator while any debit leg is
    /// claimed; a set flag blocks destruction of the whole transaction.
    pub fn debit_guard(&self) -> bool {
        self.debit
    }

    pub fn set_debit_guard(&mut self, claimed: bool) {
        self.debit = claimed;
    }

    pub fn set_num(&mut self, num: impl Into<String>) {
        self.num = num.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Memo of the credit leg.
    pub fn set_memo(&mut self, memo: impl Into<String>) {
        self.credit_split.set_memo(memo);
    }

    /// Action of the credit leg.
    pub fn set_action(&mut self, action: impl Into<String>) {
        self.credit_split.set_action(action);
    }

    /// Reconcile state of the credit leg.
    pub fn set_reconciled(&mut self, reconciled: Reconciled) {
        self.credit_split.set_reconciled(reconciled);
    }

    pub(crate) fn split_by_id(&self, id: SplitId) -> Option<&Split> {
        if self.credit_split.id_typed() == id {
            return Some(&self.credit_split);
        }
        self.debit_splits.iter().find(|s| s.id_typed() == id)
    }

    pub(crate) fn split_by_id_mut(&mut self, id: SplitId) -> Option<&mut Split> {
        if self.credit_split.id_typed() == id {
            return Some(&mut self.credit_split);
        }
        self.debit_splits.iter_mut().find(|s| s.id_typed() == id)
    }

    /// Insert a split as the new last debit leg and re-balance.
    pub(crate) fn append(&mut self, mut split: Split) {
        split.set_parent(Some(self.id));
        self.debit_splits.push(split);
        self.recompute_credit();
    }

    /// Remove the identical debit leg, preserving the relative order of the
    /// remaining legs, and re-balance. The embedded credit leg never leaves
    /// its transaction, so its id yields `None`.
    pub(crate) fn remove(&mut self, id: SplitId) -> Option<Split> {
        let pos = self.debit_splits.iter().position(|s| s.id_typed() == id)?;
        let mut split = self.debit_splits.remove(pos);
        split.set_parent(None);
        self.recompute_credit();
        Some(split)
    }

    /// Take the whole debit collection out, leaving it empty. Parents are
    /// left for the caller to clear.
    pub(crate) fn take_debit_splits(&mut self) -> Vec<Split> {
        core::mem::take(&mut self.debit_splits)
    }

    /// Rewrite the credit leg from the debit legs.
    ///
    /// With exactly one debit leg the credit leg mirrors its quantity and
    /// price exactly; with zero or several legs the credit leg carries the
    /// negated monetary sum at a price of 1.0.
    pub fn recompute_credit(&mut self) {
        let amount: f64 = self.debit_splits.iter().map(Split::value).sum();

        if let [only] = self.debit_splits.as_slice() {
            let (damount, share_price) = (only.damount, only.share_price);
            self.credit_split.damount = -damount;
            self.credit_split.share_price = share_price;
        } else {
            self.credit_split.damount = -amount;
            self.credit_split.share_price = 1.0;
        }
    }

    /// Check that all legs net to zero monetary value within `tolerance`.
    pub fn verify_balanced(&self, tolerance: f64) -> DomainResult<()> {
        let net: f64 =
            self.debit_splits.iter().map(Split::value).sum::<f64>() + self.credit_split.value();
        if net.abs() <= tolerance {
            Ok(())
        } else {
            Err(DomainError::invariant(format!(
                "transaction legs net to {net}, not zero"
            )))
        }
    }
}

impl Entity for Transaction {
    type Id = TransactionId;

    fn id(&self) -> TransactionId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_transaction() -> Transaction {
        Transaction::new(
            TransactionId::new(EntityId::new()),
            SplitId::new(EntityId::new()),
        )
    }

    fn test_split(damount: f64, share_price: f64) -> Split {
        let mut split = Split::new(SplitId::new(EntityId::new()));
        split.damount = damount;
        split.share_price = share_price;
        split
    }

    #[test]
    fn new_transaction_has_register_defaults() {
        let trans = test_transaction();
        assert_eq!(trans.num, "");
        assert_eq!(trans.description, "");
        assert_eq!(trans.date, NaiveDate::from_ymd_opt(1900, 1, 1).unwrap());
        assert!(trans.debit_splits().is_empty());
        assert_eq!(trans.credit_split().parent(), Some(trans.id_typed()));
        assert!(!trans.debit_guard());
    }

    #[test]
    fn single_leg_mirrors_amount_and_price() {
        // Scenario: append split(damount=100, price=1).
        let mut trans = test_transaction();
        trans.append(test_split(100.0, 1.0));
        assert_eq!(trans.credit_split().damount, -100.0);
        assert_eq!(trans.credit_split().share_price, 1.0);

        // Mirroring is exact, not derived from the product.
        let mut trans = test_transaction();
        trans.append(test_split(30.0, 2.5));
        assert_eq!(trans.credit_split().damount, -30.0);
        assert_eq!(trans.credit_split().share_price, 2.5);
        trans.verify_balanced(1e-9).unwrap();
    }

    #[test]
    fn two_legs_sum_at_unit_price() {
        let mut trans = test_transaction();
        trans.append(test_split(60.0, 1.0));
        trans.append(test_split(40.0, 1.0));
        assert_eq!(trans.credit_split().damount, -100.0);
        assert_eq!(trans.credit_split().share_price, 1.0);
        trans.verify_balanced(1e-9).unwrap();
    }

    #[test]
    fn removal_falls_back_to_single_leg_mirroring() {
        let mut trans = test_transaction();
        trans.append(test_split(60.0, 1.0));
        trans.append(test_split(40.0, 1.0));
        let first = trans.debit_splits()[0].id_typed();

        let removed = trans.remove(first).unwrap();
        assert_eq!(removed.damount, 60.0);
        assert_eq!(removed.parent(), None);
        assert_eq!(trans.split_count(), 1);
        assert_eq!(trans.credit_split().damount, -40.0);
        assert_eq!(trans.credit_split().share_price, 1.0);
    }

    #[test]
    fn empty_collection_recomputes_to_zero() {
        let mut trans = test_transaction();
        trans.recompute_credit();
        assert_eq!(trans.credit_split().damount, 0.0);
        assert_eq!(trans.credit_split().share_price, 1.0);
    }

    #[test]
    fn credit_leg_cannot_be_removed() {
        let mut trans = test_transaction();
        let credit_id = trans.credit_split().id_typed();
        assert!(trans.remove(credit_id).is_none());
        assert_eq!(trans.credit_split().parent(), Some(trans.id_typed()));
    }

    #[test]
    fn direct_field_writes_are_not_auto_synced() {
        let mut trans = test_transaction();
        trans.append(test_split(10.0, 1.0));
        trans
            .split_by_id_mut(trans.debit_splits()[0].id_typed())
            .unwrap()
            .damount = 99.0;

        // Stale until the caller re-triggers the recompute.
        assert_eq!(trans.credit_split().damount, -10.0);
        trans.recompute_credit();
        assert_eq!(trans.credit_split().damount, -99.0);
    }

    #[test]
    fn unbalanced_legs_fail_verification() {
        let mut trans = test_transaction();
        trans.append(test_split(10.0, 1.0));
        trans.split_by_id_mut(trans.debit_splits()[0].id_typed()).unwrap().damount = 99.0;
        let err = trans.verify_balanced(1e-9).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any multi-leg transaction, the legs net to zero
        /// monetary value and the credit leg's price is normalized to 1.0.
        #[test]
        fn multi_leg_balance_is_conserved(
            legs in prop::collection::vec(
                (-1_000_000.0f64..1_000_000.0, 0.01f64..1_000.0),
                2..8,
            )
        ) {
            let mut trans = test_transaction();
            let mut magnitude = 0.0f64;
            for (damount, share_price) in legs {
                magnitude += (damount * share_price).abs();
                trans.append(test_split(damount, share_price));
            }

            prop_assert_eq!(trans.credit_split().share_price, 1.0);
            let net = trans
                .debit_splits()
                .iter()
                .map(Split::value)
                .sum::<f64>()
                + trans.credit_split().value();
            prop_assert!(net.abs() <= 1e-6 * (1.0 + magnitude));
        }

        /// Property: appending then removing a split restores the prior
        /// collection contents and order.
        #[test]
        fn append_remove_round_trips(
            base in prop::collection::vec(
                (-1_000.0f64..1_000.0, 0.01f64..100.0),
                0..5,
            ),
            extra in (-1_000.0f64..1_000.0, 0.01f64..100.0),
        ) {
            let mut trans = test_transaction();
            for (damount, share_price) in base {
                trans.append(test_split(damount, share_price));
            }
            let before: Vec<SplitId> =
                trans.debit_splits().iter().map(Split::id_typed).collect();
            let credit_before = trans.credit_split().clone();

            let split = test_split(extra.0, extra.1);
            let extra_id = split.id_typed();
            trans.append(split);
            trans.remove(extra_id);

            let after: Vec<SplitId> =
                trans.debit_splits().iter().map(Split::id_typed).collect();
            prop_assert_eq!(before, after);
            prop_assert_eq!(trans.credit_split(), &credit_before);
        }
    }
}
