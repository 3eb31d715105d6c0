//! Oracle adapter: timeout, retry and caching around a price provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use tonvault_common::{Asset, VaultError, VaultResult};

use crate::provider::PriceProvider;
use crate::snapshot::PriceSnapshot;

/// Configuration for the oracle adapter.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Upper bound on one provider call.
    pub timeout: Duration,
    /// Retry once with a fresh call before surfacing `PriceUnavailable`.
    pub retry_once: bool,
    /// How long a fetched price stays usable from cache.
    pub cache_ttl: chrono::Duration,
    /// Whether to use the cache at all.
    pub use_cache: bool,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retry_once: true,
            cache_ttl: chrono::Duration::seconds(10),
            use_cache: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CachedPrice {
    price: Decimal,
    fetched_at: DateTime<Utc>,
}

/// Price oracle with a bounded timeout, one retry and a per-asset TTL
/// cache. The provider is an explicitly constructed, passed-in
/// dependency; the adapter owns no global state.
pub struct PriceOracle {
    provider: Arc<dyn PriceProvider>,
    cache: DashMap<Asset, CachedPrice>,
    config: OracleConfig,
}

impl PriceOracle {
    /// Create a new oracle over the given provider.
    pub fn new(provider: Arc<dyn PriceProvider>, config: OracleConfig) -> Self {
        Self {
            provider,
            cache: DashMap::new(),
            config,
        }
    }

    /// Fetch a snapshot covering `assets`.
    ///
    /// Serves from cache when every requested asset is fresh; otherwise
    /// calls the provider under the configured timeout, retrying once.
    /// Any failure after the retry surfaces as `PriceUnavailable`.
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn snapshot(&self, assets: &[Asset]) -> VaultResult<PriceSnapshot> {
        if self.config.use_cache {
            if let Some(cached) = self.cached_snapshot(assets) {
                debug!("serving prices from cache");
                return Ok(cached);
            }
        }

        let snapshot = match self.fetch(assets).await {
            Ok(snapshot) => snapshot,
            Err(first) if self.config.retry_once => {
                warn!(error = %first, "price fetch failed, retrying once");
                self.fetch(assets).await?
            }
            Err(err) => return Err(err),
        };

        if self.config.use_cache {
            let now = Utc::now();
            for asset in assets {
                if let Some(price) = snapshot.usd_price(*asset) {
                    self.cache.insert(
                        *asset,
                        CachedPrice {
                            price,
                            fetched_at: now,
                        },
                    );
                }
            }
        }

        Ok(snapshot)
    }

    /// Drop all cached prices.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    async fn fetch(&self, assets: &[Asset]) -> VaultResult<PriceSnapshot> {
        match tokio::time::timeout(self.config.timeout, self.provider.get_prices(assets)).await {
            Ok(result) => result,
            Err(_) => Err(VaultError::PriceUnavailable {
                reason: format!(
                    "{} did not answer within {:?}",
                    self.provider.name(),
                    self.config.timeout
                ),
            }),
        }
    }

    fn cached_snapshot(&self, assets: &[Asset]) -> Option<PriceSnapshot> {
        let now = Utc::now();
        let mut prices = HashMap::new();
        for asset in assets {
            let entry = self.cache.get(asset)?;
            if now.signed_duration_since(entry.fetched_at) >= self.config.cache_ttl {
                return None;
            }
            prices.insert(*asset, entry.price);
        }
        Some(PriceSnapshot::new(prices))
    }
}
