//! TonVault Engine
//!
//! The orchestration crate of the TonVault core: the exchange engine,
//! the withdrawal/deposit processor, the settings store, and the
//! [`VaultService`] facade that assembles them over a price provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tonvault_engine::{Settings, VaultService, WithdrawalRequest};
//! use tonvault_oracle::{MockPriceProvider, OracleConfig};
//!
//! let provider = Arc::new(MockPriceProvider::new("feed"));
//! let vault = VaultService::new(provider, OracleConfig::default(), Settings::default())?;
//!
//! let receipt = vault
//!     .commit_exchange(account, Asset::Ton, Asset::Usdt, amount)
//!     .await?;
//! ```

pub mod exchange;
pub mod service;
pub mod settings;
pub mod transfer;

pub use exchange::{ExchangeEngine, ExchangeReceipt, Quote};
pub use service::VaultService;
pub use settings::{Settings, SettingsStore};
pub use transfer::{AdminTxRequest, TransferProcessor, TransferReceipt, WithdrawalRequest};
