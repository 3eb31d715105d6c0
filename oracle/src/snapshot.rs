//! Ephemeral price snapshots.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use tonvault_common::Asset;

/// USD unit prices for a set of assets, valid for one request.
#[derive(Debug, Clone)]
pub struct PriceSnapshot {
    prices: HashMap<Asset, Decimal>,
    fetched_at: DateTime<Utc>,
}

impl PriceSnapshot {
    /// Create a snapshot from fetched prices.
    pub fn new(prices: HashMap<Asset, Decimal>) -> Self {
        Self {
            prices,
            fetched_at: Utc::now(),
        }
    }

    /// USD price for one asset. Returns `None` if the feed did not quote
    /// the asset or quoted a non-positive price; callers treat both as
    /// "price unavailable".
    pub fn usd_price(&self, asset: Asset) -> Option<Decimal> {
        self.prices
            .get(&asset)
            .copied()
            .filter(|p| *p > Decimal::ZERO)
    }

    /// When the prices were fetched.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Whether every requested asset has a usable price.
    pub fn covers(&self, assets: &[Asset]) -> bool {
        assets.iter().all(|a| self.usd_price(*a).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_non_positive_price_treated_as_missing() {
        let mut prices = HashMap::new();
        prices.insert(Asset::Ton, dec!(3));
        prices.insert(Asset::Btc, dec!(0));
        let snapshot = PriceSnapshot::new(prices);

        assert_eq!(snapshot.usd_price(Asset::Ton), Some(dec!(3)));
        assert_eq!(snapshot.usd_price(Asset::Btc), None);
        assert_eq!(snapshot.usd_price(Asset::Eth), None);
        assert!(snapshot.covers(&[Asset::Ton]));
        assert!(!snapshot.covers(&[Asset::Ton, Asset::Btc]));
    }
}
