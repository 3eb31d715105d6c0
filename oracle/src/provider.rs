//! Price provider trait and test implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::debug;

use tonvault_common::{Asset, VaultError, VaultResult};

use crate::snapshot::PriceSnapshot;

/// Trait for USD price feeds.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch current USD prices for the given assets.
    async fn get_prices(&self, assets: &[Asset]) -> VaultResult<PriceSnapshot>;
}

/// In-memory provider for tests and local runs.
///
/// Prices are settable per asset; `fail_times` scripts a number of
/// upcoming calls to fail, which exercises the adapter's retry path.
pub struct MockPriceProvider {
    name: String,
    prices: DashMap<Asset, Decimal>,
    failures_remaining: AtomicU32,
    /// Artificial latency per call, for timeout tests.
    delay: Option<std::time::Duration>,
}

impl MockPriceProvider {
    /// Create a provider with no prices set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prices: DashMap::new(),
            failures_remaining: AtomicU32::new(0),
            delay: None,
        }
    }

    /// Set the USD price for one asset.
    pub fn set_price(&self, asset: Asset, price: Decimal) {
        self.prices.insert(asset, price);
    }

    /// Make the next `n` calls fail.
    pub fn fail_times(&self, n: u32) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Delay every call by `delay`.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl PriceProvider for MockPriceProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_prices(&self, assets: &[Asset]) -> VaultResult<PriceSnapshot> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            debug!(provider = %self.name, "scripted failure");
            return Err(VaultError::PriceUnavailable {
                reason: format!("{}: scripted failure", self.name),
            });
        }

        let mut prices = HashMap::new();
        for asset in assets {
            if let Some(price) = self.prices.get(asset) {
                prices.insert(*asset, *price);
            }
        }
        Ok(PriceSnapshot::new(prices))
    }
}
