//! Deterministic ordering of transactions and splits.
//!
//! Ledger displays and running-balance computation need one consistent order
//! across the whole book, so both comparators chain several keys: date, then
//! `num`, then `description` for transactions; parent-transaction order,
//! then `memo`, then `action` for splits. Transactions sharing all three
//! keys compare equal even when distinct — the order is consistent but not
//! total, and display code must tolerate such ties.
//!
//! Both functions are pure and absorb absent operands, so they can be handed
//! directly to a stable sort.

use std::cmp::Ordering;

use crate::split::Split;
use crate::transaction::Transaction;

/// A split paired with its resolved parent transaction — the unit the split
/// comparator operates over.
#[derive(Debug, Copy, Clone)]
pub struct SplitRef<'a> {
    pub split: &'a Split,
    pub parent: Option<&'a Transaction>,
}

/// Three-way comparison of two (possibly absent) transactions.
///
/// A present transaction sorts before an absent one; two absent transactions
/// compare equal. Present pairs compare by date, then `num`, then
/// `description`.
pub fn transaction_order(a: Option<&Transaction>, b: Option<&Transaction>) -> Ordering {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => return Ordering::Equal,
    };

    let by_date = a.date.cmp(&b.date);
    if by_date != Ordering::Equal {
        return by_date;
    }

    let by_num = text_order(Some(&a.num), Some(&b.num));
    if by_num != Ordering::Equal {
        return by_num;
    }

    text_order(Some(&a.description), Some(&b.description))
}

/// Three-way comparison of two (possibly absent) splits.
///
/// The top-level presence rule matches [`transaction_order`]. Present pairs
/// compare by their parent transactions first, then `memo`, then `action`.
pub fn split_order(a: Option<SplitRef<'_>>, b: Option<SplitRef<'_>>) -> Ordering {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        (Some(_), None) => return Ordering::Less,
        (None, Some(_)) => return Ordering::Greater,
        (None, None) => return Ordering::Equal,
    };

    let by_parent = transaction_order(a.parent, b.parent);
    if by_parent != Ordering::Equal {
        return by_parent;
    }

    let by_memo = text_order(Some(&a.split.memo), Some(&b.split.memo));
    if by_memo != Ordering::Equal {
        return by_memo;
    }

    text_order(a.split.action.as_deref(), b.split.action.as_deref())
}

/// String tie-break rule, applied identically at every string key:
/// lexicographic when both sides are present, otherwise the absent side
/// sorts first. Note the asymmetry with the entity presence checks above,
/// where the absent side sorts last.
fn text_order(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
