//! A split: one leg of a double-entry transaction.

use serde::{Deserialize, Serialize};

use splitbook_core::{AccountId, DomainError, DomainResult, Entity, EntityId};

use crate::transaction::TransactionId;

/// Split identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SplitId(pub EntityId);

impl SplitId {
    pub fn new(id: EntityId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SplitId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Bank-statement matching status of a split.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reconciled {
    #[default]
    NotReconciled,
    Cleared,
    Reconciled,
}

impl Reconciled {
    /// Single-character register flag, as shown in ledger columns.
    pub fn flag(self) -> char {
        match self {
            Reconciled::NotReconciled => 'n',
            Reconciled::Cleared => 'c',
            Reconciled::Reconciled => 'y',
        }
    }

    /// Parse a register flag character.
    pub fn from_flag(flag: char) -> DomainResult<Self> {
        match flag {
            'n' => Ok(Reconciled::NotReconciled),
            'c' => Ok(Reconciled::Cleared),
            'y' => Ok(Reconciled::Reconciled),
            other => Err(DomainError::validation(format!(
                "unknown reconcile flag: {other:?}"
            ))),
        }
    }
}

/// One leg of a double-entry transaction.
///
/// A split carries a signed share quantity (`damount`) and a price per share;
/// the monetary value of the leg is their product. The four running-balance
/// fields are caches maintained by the account collaborator — the register
/// reads them back but never computes them.
///
/// `parent` and `account` are non-owning handles: `parent` says which
/// transaction's debit collection the split currently resides in (or which
/// transaction embeds it as the credit leg), and a present `account` marks
/// the split as claimed, which blocks destruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    id: SplitId,
    parent: Option<TransactionId>,
    account: Option<AccountId>,
    pub memo: String,
    pub action: Option<String>,
    pub reconciled: Reconciled,
    /// Share quantity (signed).
    pub damount: f64,
    /// Price per share.
    pub share_price: f64,
    pub balance: f64,
    pub cleared_balance: f64,
    pub reconciled_balance: f64,
    pub share_balance: f64,
    write_flag: bool,
}

impl Split {
    pub(crate) fn new(id: SplitId) -> Self {
        Self {
            id,
            parent: None,
            account: None,
            memo: String::new(),
            action: None,
            reconciled: Reconciled::NotReconciled,
            damount: 0.0,
            share_price: 1.0,
            balance: 0.0,
            cleared_balance: 0.0,
            reconciled_balance: 0.0,
            share_balance: 0.0,
            write_flag: false,
        }
    }

    pub fn id_typed(&self) -> SplitId {
        self.id
    }

    /// Transaction this split currently resides in, if any.
    pub fn parent(&self) -> Option<TransactionId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<TransactionId>) {
        self.parent = parent;
    }

    /// Account currently claiming this split, if any.
    pub fn account(&self) -> Option<AccountId> {
        self.account
    }

    /// Whether an account has claimed this split.
    ///
    /// Claimed splits survive destruction requests; see
    /// [`Book::destroy_split`](crate::Book::destroy_split).
    pub fn is_claimed(&self) -> bool {
        self.account.is_some()
    }

    /// Record a claim by the external account collaborator.
    pub fn set_account(&mut self, account: AccountId) {
        self.account = Some(account);
    }

    /// Release the account claim. The account itself is untouched; dropping
    /// the split from the account's own records is the caller's job.
    pub fn clear_account(&mut self) {
        self.account = None;
    }

    /// Monetary value of this leg: `damount * share_price`.
    pub fn value(&self) -> f64 {
        self.damount * self.share_price
    }

    pub fn set_memo(&mut self, memo: impl Into<String>) {
        self.memo = memo.into();
    }

    pub fn set_action(&mut self, action: impl Into<String>) {
        self.action = Some(action.into());
    }

    pub fn clear_action(&mut self) {
        self.action = None;
    }

    pub fn set_reconciled(&mut self, reconciled: Reconciled) {
        self.reconciled = reconciled;
    }

    /// Set the share quantity directly.
    pub fn set_share_amount(&mut self, amount: f64) {
        self.damount = amount;
    }

    /// Set the monetary amount, expressed back into shares at the current
    /// `share_price`.
    pub fn set_amount(&mut self, amount: f64) {
        self.damount = amount / self.share_price;
    }

    /// Dirty marker used by the persistence collaborator.
    pub fn write_flag(&self) -> bool {
        self.write_flag
    }

    pub fn set_write_flag(&mut self, flag: bool) {
        self.write_flag = flag;
    }
}

impl Entity for Split {
    type Id = SplitId;

    fn id(&self) -> SplitId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_split() -> Split {
        Split::new(SplitId::new(EntityId::new()))
    }

    #[test]
    fn new_split_has_register_defaults() {
        let split = test_split();
        assert_eq!(split.memo, "");
        assert_eq!(split.action, None);
        assert_eq!(split.reconciled, Reconciled::NotReconciled);
        assert_eq!(split.damount, 0.0);
        assert_eq!(split.share_price, 1.0);
        assert_eq!(split.parent(), None);
        assert!(!split.is_claimed());
        assert!(!split.write_flag());
        assert_eq!(split.balance, 0.0);
        assert_eq!(split.share_balance, 0.0);
    }

    #[test]
    fn set_amount_divides_by_share_price() {
        let mut split = test_split();
        split.share_price = 4.0;
        split.set_amount(100.0);
        assert_eq!(split.damount, 25.0);
        assert_eq!(split.value(), 100.0);
    }

    #[test]
    fn claim_gates_and_releases() {
        let mut split = test_split();
        assert!(!split.is_claimed());
        split.set_account(AccountId::new());
        assert!(split.is_claimed());
        split.clear_account();
        assert!(!split.is_claimed());
    }

    #[test]
    fn split_is_an_entity() {
        let split = test_split();
        assert_eq!(Entity::id(&split), split.id_typed());
    }

    #[test]
    fn reconcile_flags_round_trip() {
        for state in [
            Reconciled::NotReconciled,
            Reconciled::Cleared,
            Reconciled::Reconciled,
        ] {
            assert_eq!(Reconciled::from_flag(state.flag()).unwrap(), state);
        }
        assert!(matches!(
            Reconciled::from_flag('x').unwrap_err(),
            DomainError::Validation(_)
        ));
    }
}
