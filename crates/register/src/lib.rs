//! Double-entry register core: splits, transactions, ordering, lifecycle.
//!
//! Pure domain logic only: no IO, no persistence concerns. The [`Book`]
//! registry owns every live entity and hands out typed handles; the
//! [`order`] module defines the deterministic sort used by ledger displays
//! and running-balance computation.

pub mod book;
pub mod order;
pub mod split;
pub mod transaction;

pub use book::Book;
pub use order::{SplitRef, split_order, transaction_order};
pub use split::{Reconciled, Split, SplitId};
pub use transaction::{Transaction, TransactionId};
