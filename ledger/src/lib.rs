//! TonVault Ledger
//!
//! Authoritative per-account balances and the append-mostly transaction
//! journal. All balance mutations for one account go through a single
//! serialized `apply_delta`, so a set of debits and credits either lands
//! as a whole or not at all.

pub mod balance;
pub mod journal;
pub mod locks;
pub mod store;

pub use balance::{BalanceDelta, BalanceSet};
pub use journal::{Journal, MetadataPatch, Page, TxDraft, TxFilter, TxRecord};
pub use locks::AccountLocks;
pub use store::{ApplyOptions, Ledger};
