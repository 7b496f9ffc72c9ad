//! Utility functions for poolscope.
//!
//! - [`conversion`] - Fixed-point (U256/I256) to f64 conversions
//! - [`validation`] - Checks on decoded and derived values

mod conversion;
mod validation;

pub use conversion::{i256_to_f64_safe, u256_to_f64_safe, FIXED_POINT_DECIMALS};
pub use validation::{validate_finite, validate_oracle_rate};
