//! Fixed-point to float conversions.
//!
//! On-chain quantities arrive as 18-decimal (or oracle-specific) fixed-point
//! integers. They are scaled through BigDecimal so values above 2^53 keep
//! their precision until the final f64 cast.

use alloy::primitives::{I256, U256};
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::ToPrimitive;
use once_cell::sync::Lazy;

/// Decimals of every pool-side quantity (rate, balances, supply).
pub const FIXED_POINT_DECIMALS: u8 = 18;

/// Convert U256 to f64 with decimal adjustment.
///
/// Returns `None` when the adjusted value is not a finite f64.
///
/// # Example
/// ```ignore
/// let value = U256::from(1_000_000_000_000_000_000u128); // 1e18
/// let adjusted = u256_to_f64_safe(value, 18); // Some(1.0)
/// ```
pub fn u256_to_f64_safe(value: U256, decimals: u8) -> Option<f64> {
    let bytes: [u8; 32] = value.to_le_bytes();
    let big_int = BigInt::from_bytes_le(Sign::Plus, &bytes);
    scale(BigDecimal::from(big_int), decimals)
}

/// Convert a signed oracle answer to f64 with decimal adjustment.
///
/// Negative answers are rejected: no exchange rate between two assets can
/// legitimately be below zero.
pub fn i256_to_f64_safe(value: I256, decimals: u8) -> Option<f64> {
    if value.is_negative() {
        return None;
    }
    u256_to_f64_safe(value.into_raw(), decimals)
}

fn scale(value: BigDecimal, decimals: u8) -> Option<f64> {
    let adjusted = value / big_pow10(decimals);

    let result = adjusted.to_f64()?;

    if result.is_finite() {
        Some(result)
    } else {
        None
    }
}

static POW10_CACHE: Lazy<[BigDecimal; 25]> =
    Lazy::new(|| std::array::from_fn(|i| BigDecimal::from(BigInt::from(10u32).pow(i as u32))));

/// Compute 10^exp as BigDecimal.
pub(crate) fn big_pow10(exp: u8) -> BigDecimal {
    if (exp as usize) < POW10_CACHE.len() {
        POW10_CACHE[exp as usize].clone()
    } else {
        BigDecimal::from(BigInt::from(10u32).pow(exp as u32))
    }
}
