//! The book: lifecycle registry for splits and transactions.
//!
//! Every live entity is owned here and addressed through typed handles. A
//! detached split (freshly created, or removed from a transaction) sits in
//! the detached pool until it is appended somewhere or destroyed. All
//! operations are total: an unknown handle behaves like a null operand and
//! degrades to a no-op or a neutral value.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use splitbook_core::EntityId;

use crate::order::{SplitRef, split_order, transaction_order};
use crate::split::{Split, SplitId};
use crate::transaction::{Transaction, TransactionId};

/// Where a live split currently resides.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum SplitPlace {
    /// In the detached pool, owned by no transaction.
    Detached,
    /// In a transaction's debit collection, or embedded as its credit leg.
    Resident(TransactionId),
}

/// Registry owning all live transactions and detached splits.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    transactions: HashMap<TransactionId, Transaction>,
    detached: HashMap<SplitId, Split>,
    /// Fast lookup: split handle -> current location, so handle resolution
    /// does not scan every transaction.
    index: HashMap<SplitId, SplitPlace>,
}

impl Book {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------

    /// Create a default-initialized detached split and return its handle.
    pub fn new_split(&mut self) -> SplitId {
        let id = SplitId::new(EntityId::new());
        self.detached.insert(id, Split::new(id));
        self.index.insert(id, SplitPlace::Detached);
        id
    }

    /// Create a default-initialized transaction (empty debit collection,
    /// credit leg parented to it, date 1900-01-01) and return its handle.
    pub fn new_transaction(&mut self) -> TransactionId {
        let id = TransactionId::new(EntityId::new());
        let credit_id = SplitId::new(EntityId::new());
        self.index.insert(credit_id, SplitPlace::Resident(id));
        self.transactions.insert(id, Transaction::new(id, credit_id));
        id
    }

    // -----------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.get(&id)
    }

    pub fn transaction_mut(&mut self, id: TransactionId) -> Option<&mut Transaction> {
        self.transactions.get_mut(&id)
    }

    /// Resolve a split handle, detached or resident (credit legs included).
    pub fn split(&self, id: SplitId) -> Option<&Split> {
        match self.index.get(&id)? {
            SplitPlace::Detached => self.detached.get(&id),
            SplitPlace::Resident(tid) => self.transactions.get(tid)?.split_by_id(id),
        }
    }

    pub fn split_mut(&mut self, id: SplitId) -> Option<&mut Split> {
        match self.index.get(&id)? {
            SplitPlace::Detached => self.detached.get_mut(&id),
            SplitPlace::Resident(tid) => {
                let tid = *tid;
                self.transactions.get_mut(&tid)?.split_by_id_mut(id)
            }
        }
    }

    /// Number of live transactions.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Number of debit legs in a transaction; 0 for an unknown handle.
    pub fn count_splits(&self, id: TransactionId) -> usize {
        self.transactions.get(&id).map_or(0, Transaction::split_count)
    }

    // -----------------------------------------------------------------
    // Collection mutation
    // -----------------------------------------------------------------

    /// Move a detached split into a transaction's debit collection as its
    /// new last element and re-balance the credit leg.
    ///
    /// A no-op when either handle is unknown, or when the split already
    /// resides in a transaction. Claim state is untouched.
    pub fn append_split(&mut self, tid: TransactionId, sid: SplitId) {
        if !self.transactions.contains_key(&tid) {
            return;
        }
        let Some(split) = self.detached.remove(&sid) else {
            return;
        };
        self.index.insert(sid, SplitPlace::Resident(tid));
        if let Some(trans) = self.transactions.get_mut(&tid) {
            trans.append(split);
        }
    }

    /// Pull a split out of its transaction back into the detached pool,
    /// preserving the relative order of the remaining legs, and re-balance.
    ///
    /// A no-op when the handle is unknown, the split is already detached, or
    /// the handle names an embedded credit leg. Does not release any account
    /// claim on the split; that remains the caller's responsibility.
    pub fn remove_split(&mut self, sid: SplitId) {
        let Some(SplitPlace::Resident(tid)) = self.index.get(&sid).copied() else {
            return;
        };
        let Some(trans) = self.transactions.get_mut(&tid) else {
            return;
        };
        let Some(split) = trans.remove(sid) else {
            return;
        };
        self.index.insert(sid, SplitPlace::Detached);
        self.detached.insert(sid, split);
    }

    // -----------------------------------------------------------------
    // Destruction
    // -----------------------------------------------------------------

    /// Destroy a split unless it is claimed by an account.
    ///
    /// Returns `true` when the split was released, `false` when the handle
    /// is unknown, the split is claimed (it stays fully intact and usable),
    /// or the handle names an embedded credit leg.
    pub fn destroy_split(&mut self, sid: SplitId) -> bool {
        let Some(split) = self.split(sid) else {
            return false;
        };
        if split.is_claimed() {
            tracing::debug!("skipping destroy of split {} claimed by an account", sid);
            return false;
        }

        self.remove_split(sid);
        if self.detached.remove(&sid).is_none() {
            // An embedded credit leg cannot be destroyed on its own.
            return false;
        }
        self.index.remove(&sid);
        true
    }

    /// Destroy a transaction unless its debit guard flag is set or its
    /// credit leg is claimed.
    ///
    /// The guard consults only those two markers, never the individual debit
    /// legs' claims. On success the embedded credit leg dies with the
    /// transaction, while any remaining debit legs are orphaned into the
    /// detached pool without being destroyed, so an account that claimed one
    /// still finds it through its handle. Returns `true` when the
    /// transaction was released.
    pub fn destroy_transaction(&mut self, tid: TransactionId) -> bool {
        let Some(trans) = self.transactions.get(&tid) else {
            return false;
        };
        if trans.debit_guard() || trans.credit_split().is_claimed() {
            tracing::debug!("skipping destroy of claimed transaction {}", tid);
            return false;
        }

        let Some(mut trans) = self.transactions.remove(&tid) else {
            return false;
        };
        self.index.remove(&trans.credit_split().id_typed());
        for mut split in trans.take_debit_splits() {
            split.set_parent(None);
            let sid = split.id_typed();
            self.index.insert(sid, SplitPlace::Detached);
            self.detached.insert(sid, split);
        }
        true
    }

    // -----------------------------------------------------------------
    // Running-balance caches
    // -----------------------------------------------------------------

    pub fn balance(&self, sid: SplitId) -> f64 {
        self.split(sid).map_or(0.0, |s| s.balance)
    }

    pub fn cleared_balance(&self, sid: SplitId) -> f64 {
        self.split(sid).map_or(0.0, |s| s.cleared_balance)
    }

    pub fn reconciled_balance(&self, sid: SplitId) -> f64 {
        self.split(sid).map_or(0.0, |s| s.reconciled_balance)
    }

    pub fn share_balance(&self, sid: SplitId) -> f64 {
        self.split(sid).map_or(0.0, |s| s.share_balance)
    }

    // -----------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------

    /// Resolve a split handle together with its parent transaction for the
    /// split comparator.
    pub fn split_ref(&self, sid: SplitId) -> Option<SplitRef<'_>> {
        let split = self.split(sid)?;
        let parent = split.parent().and_then(|tid| self.transactions.get(&tid));
        Some(SplitRef { split, parent })
    }

    /// [`split_order`] over handles; an unknown handle compares as absent.
    pub fn order_splits(&self, a: Option<SplitId>, b: Option<SplitId>) -> Ordering {
        split_order(
            a.and_then(|id| self.split_ref(id)),
            b.and_then(|id| self.split_ref(id)),
        )
    }

    /// [`transaction_order`] over handles; an unknown handle compares as
    /// absent.
    pub fn order_transactions(&self, a: Option<TransactionId>, b: Option<TransactionId>) -> Ordering {
        transaction_order(
            a.and_then(|id| self.transactions.get(&id)),
            b.and_then(|id| self.transactions.get(&id)),
        )
    }

    /// Transaction handles in display order (date, num, description).
    pub fn sorted_transaction_ids(&self) -> Vec<TransactionId> {
        let mut ids: Vec<TransactionId> = self.transactions.keys().copied().collect();
        ids.sort_by(|a, b| {
            transaction_order(self.transactions.get(a), self.transactions.get(b))
        });
        ids
    }
}
