//! Exchange settings: fee percentage and per-asset minimums.

use std::collections::HashMap;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use tonvault_common::{Asset, VaultError, VaultResult};

/// Fee and minimum-transfer configuration.
///
/// The fee percentage applies to the destination-asset amount of every
/// conversion. A per-asset minimum applies to the source-asset amount of
/// a conversion and independently to withdrawal amounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Exchange fee in percent, within `[0, 100)`.
    pub fee_percent: Decimal,
    /// Minimum transfer amount per asset; assets without an entry have no
    /// minimum.
    pub minimums: HashMap<Asset, Decimal>,
}

impl Settings {
    /// Validate invariant bounds.
    pub fn validate(&self) -> VaultResult<()> {
        if self.fee_percent < Decimal::ZERO || self.fee_percent >= Decimal::ONE_HUNDRED {
            return Err(VaultError::Validation {
                field: "fee_percent",
                message: format!("must be in [0, 100), got {}", self.fee_percent),
            });
        }
        for (asset, minimum) in &self.minimums {
            if *minimum < Decimal::ZERO {
                return Err(VaultError::Validation {
                    field: "minimums",
                    message: format!("minimum for {asset} must not be negative, got {minimum}"),
                });
            }
        }
        Ok(())
    }

    /// Minimum transfer amount for one asset (zero when unset).
    pub fn minimum_for(&self, asset: Asset) -> Decimal {
        self.minimums.get(&asset).copied().unwrap_or(Decimal::ZERO)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fee_percent: Decimal::ONE,
            minimums: HashMap::new(),
        }
    }
}

/// Read-mostly store for [`Settings`], mutable by administrators.
pub struct SettingsStore {
    inner: RwLock<Settings>,
}

impl SettingsStore {
    /// Create a store with validated initial settings.
    pub fn new(settings: Settings) -> VaultResult<Self> {
        settings.validate()?;
        Ok(Self {
            inner: RwLock::new(settings),
        })
    }

    /// Current settings.
    pub fn get(&self) -> Settings {
        self.inner.read().clone()
    }

    /// Replace the settings after validation.
    pub fn set(&self, settings: Settings) -> VaultResult<Settings> {
        settings.validate()?;
        info!(fee_percent = %settings.fee_percent, "settings updated");
        *self.inner.write() = settings.clone();
        Ok(settings)
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Settings::default()),
        }
    }
}
