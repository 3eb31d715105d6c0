//! Account balance set and delta application.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tonvault_common::{amount, Asset, VaultError, VaultResult};

/// Balances for all supported assets on one account.
///
/// Amounts are private: the only way to change them is
/// [`BalanceSet::checked_apply`], which refuses any delta that would take
/// a field negative. The `version` token increments on every committed
/// change and backs the ledger's optimistic concurrency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSet {
    amounts: [Decimal; Asset::COUNT],
    version: u64,
    updated_at: DateTime<Utc>,
}

impl BalanceSet {
    /// A freshly provisioned balance set with every asset at zero.
    pub fn zero() -> Self {
        Self {
            amounts: [Decimal::ZERO; Asset::COUNT],
            version: 0,
            updated_at: Utc::now(),
        }
    }

    /// Current amount held in one asset.
    pub fn amount(&self, asset: Asset) -> Decimal {
        self.amounts[asset.index()]
    }

    /// Optimistic-concurrency token, bumped on every committed change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// When this row was last mutated.
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Iterate over all `(asset, amount)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Asset, Decimal)> + '_ {
        Asset::ALL.iter().map(|a| (*a, self.amounts[a.index()]))
    }

    /// Apply a delta, returning the resulting set.
    ///
    /// Either every field of the result is valid or an error is returned
    /// and `self` is untouched; there is no partial application. Amounts
    /// are quantized to the storable precision on the way in.
    pub fn checked_apply(&self, delta: &BalanceDelta) -> VaultResult<BalanceSet> {
        let mut next = self.amounts;
        for (asset, change) in delta.iter() {
            let slot = &mut next[asset.index()];
            let updated = amount::quantize(*slot + change);
            if updated < Decimal::ZERO {
                return Err(VaultError::InsufficientFunds {
                    asset,
                    requested: -change,
                    available: *slot,
                });
            }
            *slot = updated;
        }
        Ok(BalanceSet {
            amounts: next,
            version: self.version + 1,
            updated_at: Utc::now(),
        })
    }
}

/// A signed change across one or more assets, applied as one unit.
#[derive(Debug, Clone, Default)]
pub struct BalanceDelta {
    entries: Vec<(Asset, Decimal)>,
}

impl BalanceDelta {
    /// An empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a debit (negative change) for one asset.
    pub fn debit(self, asset: Asset, amount: Decimal) -> Self {
        self.change(asset, -amount)
    }

    /// Add a credit (positive change) for one asset.
    pub fn credit(self, asset: Asset, amount: Decimal) -> Self {
        self.change(asset, amount)
    }

    /// Add a raw signed change for one asset. Changes to the same asset
    /// accumulate.
    pub fn change(mut self, asset: Asset, signed: Decimal) -> Self {
        let signed = amount::quantize(signed);
        if let Some(entry) = self.entries.iter_mut().find(|(a, _)| *a == asset) {
            entry.1 += signed;
        } else {
            self.entries.push((asset, signed));
        }
        self
    }

    /// Whether the delta changes nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(asset, signed_change)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Asset, Decimal)> + '_ {
        self.entries.iter().copied()
    }
}
