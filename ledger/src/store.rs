//! The balance ledger: authoritative per-account balance rows.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, instrument};

use tonvault_common::{AccountId, VaultError, VaultResult};

use crate::balance::{BalanceDelta, BalanceSet};

/// Options for [`Ledger::apply_delta`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Provision the account with zero defaults if it does not exist yet.
    pub provision: bool,
    /// Fail with `Conflict` unless the row is still at this version.
    pub expected_version: Option<u64>,
}

impl ApplyOptions {
    /// Provision-if-missing options.
    pub fn provisioning() -> Self {
        Self {
            provision: true,
            expected_version: None,
        }
    }
}

/// Owns every account's balance row.
///
/// Each mutation runs as one conditional update while holding the row's
/// map entry, so concurrent operations on the same account are serialized
/// and there is no separate read-then-write window. Operations on
/// different accounts proceed in parallel.
pub struct Ledger {
    rows: DashMap<AccountId, BalanceSet>,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    /// Current balances for all assets.
    ///
    /// Fails with `NotFound` only if the account has never been
    /// provisioned; callers that treat that as "create with defaults"
    /// should use [`Ledger::get_or_provision`].
    pub fn get(&self, account: AccountId) -> VaultResult<BalanceSet> {
        self.rows
            .get(&account)
            .map(|row| row.clone())
            .ok_or_else(|| VaultError::account_not_found(account))
    }

    /// Current balances, lazily creating the row with zero defaults.
    pub fn get_or_provision(&self, account: AccountId) -> BalanceSet {
        self.rows
            .entry(account)
            .or_insert_with(BalanceSet::zero)
            .clone()
    }

    /// Atomically apply all changes in `delta` as one unit.
    ///
    /// Guarantees: either every field changes or none does. Fails with
    /// `InsufficientFunds` if any resulting field would go negative (no
    /// partial effect), `NotFound` if the account was never provisioned
    /// and provisioning was not requested, and `Conflict` if
    /// `expected_version` no longer matches the row.
    #[instrument(skip(self, delta), fields(account = %account))]
    pub fn apply_delta(
        &self,
        account: AccountId,
        delta: &BalanceDelta,
        opts: ApplyOptions,
    ) -> VaultResult<BalanceSet> {
        match self.rows.entry(account) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get();
                if let Some(expected) = opts.expected_version {
                    if current.version() != expected {
                        return Err(VaultError::Conflict { account });
                    }
                }
                let next = current.checked_apply(delta)?;
                occupied.insert(next.clone());
                debug!(version = next.version(), "balance row updated");
                Ok(next)
            }
            Entry::Vacant(vacant) => {
                if !opts.provision {
                    return Err(VaultError::account_not_found(account));
                }
                if let Some(expected) = opts.expected_version {
                    if expected != 0 {
                        return Err(VaultError::Conflict { account });
                    }
                }
                let next = BalanceSet::zero().checked_apply(delta)?;
                vacant.insert(next.clone());
                debug!(version = next.version(), "balance row provisioned");
                Ok(next)
            }
        }
    }

    /// Number of provisioned accounts.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no account has been provisioned yet.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
