//! TonVault Price Oracle Adapter
//!
//! Fetches current USD prices per asset from an external feed behind the
//! [`PriceProvider`] trait, with a bounded timeout, one retry and a short
//! TTL cache. Consumers receive an ephemeral [`PriceSnapshot`] valid for
//! the duration of a single request, or a `PriceUnavailable` error.

pub mod adapter;
pub mod provider;
pub mod snapshot;

pub use adapter::{OracleConfig, PriceOracle};
pub use provider::{MockPriceProvider, PriceProvider};
pub use snapshot::PriceSnapshot;
