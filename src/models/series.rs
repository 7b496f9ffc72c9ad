use std::fmt;

use alloy::primitives::Address;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::ReconcileError;

/// The four independently fetched measurements of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    QuotedPrice,
    PoolBalances,
    OraclePrice,
    TotalSupply,
}

impl Metric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::QuotedPrice => "quoted_price",
            Metric::PoolBalances => "pool_balances",
            Metric::OraclePrice => "oracle_price",
            Metric::TotalSupply => "total_supply",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of measurements for one chain.
///
/// `values[i]` belongs to checkpoint `i` of the set it was fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries<T> {
    pub chain: String,
    pub metric: Metric,
    pub values: Vec<T>,
}

impl<T> MetricSeries<T> {
    pub fn new(chain: impl Into<String>, metric: Metric, values: Vec<T>) -> Self {
        Self {
            chain: chain.into(),
            metric,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fails unless the series has exactly one value per checkpoint.
    pub fn ensure_aligned(&self, expected: usize) -> Result<(), ReconcileError> {
        if self.values.len() != expected {
            return Err(ReconcileError::Misaligned {
                chain: self.chain.clone(),
                metric: self.metric,
                expected,
                actual: self.values.len(),
            });
        }
        Ok(())
    }
}

/// Token balances of a pool at one checkpoint, decimal adjusted.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSnapshot {
    balances: FxHashMap<Address, f64>,
}

impl BalanceSnapshot {
    pub fn balance_of(&self, token: &Address) -> Option<f64> {
        self.balances.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl FromIterator<(Address, f64)> for BalanceSnapshot {
    fn from_iter<I: IntoIterator<Item = (Address, f64)>>(iter: I) -> Self {
        Self {
            balances: iter.into_iter().collect(),
        }
    }
}
