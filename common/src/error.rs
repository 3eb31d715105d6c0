//! Error taxonomy for TonVault operations.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{AccountId, Asset, TxStatus};

/// Main error type for TonVault core operations.
///
/// Every public operation returns either a result or one of these kinds;
/// nothing escapes untyped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// Malformed input (missing field, out-of-range value).
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Amount is not a positive storable number.
    #[error("amount must be positive, got {amount}")]
    InvalidAmount { amount: Decimal },

    /// Exchange source and destination asset are identical.
    #[error("cannot exchange {asset} into itself")]
    SameAsset { asset: Asset },

    /// Withdrawal gross amount does not cover the network fee.
    #[error("gross amount {gross} does not exceed the network fee {fee}")]
    AmountBelowFee { gross: Decimal, fee: Decimal },

    /// Balance too low for the requested debit.
    #[error("insufficient {asset}: requested {requested}, available {available}")]
    InsufficientFunds {
        asset: Asset,
        requested: Decimal,
        available: Decimal,
    },

    /// Amount is below the per-asset minimum.
    #[error("{asset} amount {amount} is below the minimum {minimum}")]
    BelowMinimum {
        asset: Asset,
        amount: Decimal,
        minimum: Decimal,
    },

    /// Price feed unavailable, stale or non-positive.
    #[error("price unavailable: {reason}")]
    PriceUnavailable { reason: String },

    /// Unknown account or transaction id.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Illegal status change on a transaction record.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition { from: TxStatus, to: TxStatus },

    /// Concurrent mutation lost the race; the caller may retry.
    #[error("concurrent update conflict on account {account}")]
    Conflict { account: AccountId },
}

impl VaultError {
    /// Check if this error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            VaultError::Conflict { .. } | VaultError::PriceUnavailable { .. }
        )
    }

    /// Shorthand for a `NotFound` on an account.
    pub fn account_not_found(account: AccountId) -> Self {
        VaultError::NotFound {
            kind: "account",
            id: account.to_string(),
        }
    }

    /// Shorthand for a `NotFound` on a transaction.
    pub fn tx_not_found(id: impl ToString) -> Self {
        VaultError::NotFound {
            kind: "transaction",
            id: id.to_string(),
        }
    }
}

/// Result type alias for TonVault operations.
pub type VaultResult<T> = std::result::Result<T, VaultError>;
