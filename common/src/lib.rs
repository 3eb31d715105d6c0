//! TonVault Common Types
//!
//! This crate contains shared types used across the TonVault ledger core,
//! including the asset enumeration, identifiers, decimal amount policy,
//! transaction lifecycle definitions and the error taxonomy.

pub mod amount;
pub mod asset;
pub mod error;
pub mod identifiers;
pub mod transaction;

pub use amount::*;
pub use asset::*;
pub use error::*;
pub use identifiers::*;
pub use transaction::*;
