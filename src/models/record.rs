use chrono::{DateTime, Utc};
use serde::Serialize;

/// Reconciled pool state at one checkpoint.
///
/// Built once all four metric series exist and validate. Values are
/// decimal adjusted; `exchange_rate`, `total_value` and `derived_price` are
/// expressed in the chain's numeraire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRecord {
    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
    pub quoted_price: f64,
    pub token_a_balance: f64,
    pub token_b_balance: f64,
    pub exchange_rate: f64,
    pub total_supply: f64,
    pub total_value: f64,
    pub derived_price: f64,
}

impl ReconciledRecord {
    /// Pool-reported price minus the balance-sheet price.
    pub fn divergence(&self) -> f64 {
        self.quoted_price - self.derived_price
    }
}

/// Final per-chain output handed to a report sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainTable {
    pub chain: String,
    pub numeraire: String,
    pub token_a_symbol: String,
    pub token_b_symbol: String,
    /// Oracle pair (or ratio of pairs) used as the exchange rate
    pub exchange_rate_label: String,
    pub records: Vec<ReconciledRecord>,
}

impl ChainTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Largest absolute gap between the quoted and the derived price.
    pub fn max_divergence(&self) -> Option<f64> {
        self.records
            .iter()
            .map(|r| r.divergence().abs())
            .fold(None, |acc, d| Some(acc.map_or(d, |m: f64| m.max(d))))
    }
}
