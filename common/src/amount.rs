//! Decimal amount policy.
//!
//! All balances and transaction amounts carry 8 fractional digits. When a
//! computed value has more precision than is storable, it is rounded
//! toward zero so the ledger is never credited more than was computed.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{VaultError, VaultResult};

/// Fractional digits carried by every stored amount.
pub const SCALE: u32 = 8;

/// Round a value down to the storable precision.
pub fn quantize(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SCALE, RoundingStrategy::ToZero)
}

/// Validate that an amount is strictly positive, returning it quantized.
pub fn positive(amount: Decimal) -> VaultResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(VaultError::InvalidAmount { amount });
    }
    let quantized = quantize(amount);
    if quantized.is_zero() {
        // Positive but below storable precision, e.g. 1e-12.
        return Err(VaultError::InvalidAmount { amount });
    }
    Ok(quantized)
}

/// Validate that an amount is zero or positive, returning it quantized.
pub fn non_negative(amount: Decimal, field: &'static str) -> VaultResult<Decimal> {
    if amount < Decimal::ZERO {
        return Err(VaultError::Validation {
            field,
            message: format!("must not be negative, got {amount}"),
        });
    }
    Ok(quantize(amount))
}
