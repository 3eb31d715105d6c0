//! Per-account serialization locks.
//!
//! `Ledger::apply_delta` is already a single serialized operation, but
//! compound sections (check a journal record, then move funds) need the
//! whole validate-then-commit span to be exclusive per account. Locks for
//! different accounts never block each other.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use tonvault_common::AccountId;

/// Registry of one mutex per account, created on first use.
pub struct AccountLocks {
    locks: DashMap<AccountId, Arc<Mutex<()>>>,
}

impl AccountLocks {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Get the lock for one account. Callers hold the guard for the
    /// duration of their validate-then-commit section:
    ///
    /// ```ignore
    /// let lock = locks.acquire(account);
    /// let _guard = lock.lock();
    /// // serialized section
    /// ```
    pub fn acquire(&self, account: AccountId) -> Arc<Mutex<()>> {
        self.locks
            .entry(account)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for AccountLocks {
    fn default() -> Self {
        Self::new()
    }
}
