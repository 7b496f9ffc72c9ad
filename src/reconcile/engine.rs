//! Balance-sheet pricing of the pool share token.
//!
//! Pure, elementwise arithmetic over aligned series. Nothing carries over
//! from one checkpoint to the next, so running it twice on the same input
//! yields bit-identical output.

use crate::error::ReconcileError;
use crate::models::{Checkpoint, MetricSeries, ReconciledRecord};
use crate::utils::validate_finite;

/// Aligned inputs of one chain, all decimal adjusted.
///
/// `exchange_rates` converts token A into the numeraire token B, either a
/// single oracle series or an [`oracle_ratio`].
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInputs<'a> {
    pub quoted_prices: &'a MetricSeries<f64>,
    pub token_a_balances: &'a MetricSeries<f64>,
    pub token_b_balances: &'a MetricSeries<f64>,
    pub exchange_rates: &'a MetricSeries<f64>,
    pub total_supplies: &'a MetricSeries<f64>,
}

impl ReconcileInputs<'_> {
    fn ensure_aligned(&self, expected: usize) -> Result<(), ReconcileError> {
        self.quoted_prices.ensure_aligned(expected)?;
        self.token_a_balances.ensure_aligned(expected)?;
        self.token_b_balances.ensure_aligned(expected)?;
        self.exchange_rates.ensure_aligned(expected)?;
        self.total_supplies.ensure_aligned(expected)
    }
}

/// Cross rate of two oracles quoted against the same unit: `base[i] / quote[i]`.
///
/// With `base` = A/ETH and `quote` = B/ETH this yields A/B, which
/// re-denominates token A balances into token B.
pub fn oracle_ratio(
    checkpoints: &[Checkpoint],
    base: &MetricSeries<f64>,
    quote: &MetricSeries<f64>,
) -> Result<MetricSeries<f64>, ReconcileError> {
    base.ensure_aligned(checkpoints.len())?;
    quote.ensure_aligned(checkpoints.len())?;

    let values = base
        .values
        .iter()
        .zip(&quote.values)
        .zip(checkpoints)
        .map(|((b, q), cp)| {
            if *q == 0.0 {
                return Err(ReconcileError::ZeroOracleRate {
                    chain: base.chain.clone(),
                    block_number: cp.block_number,
                });
            }
            validate_finite(b / q).ok_or_else(|| ReconcileError::NonFinite {
                chain: base.chain.clone(),
                field: "exchange_rate",
                block_number: cp.block_number,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MetricSeries::new(base.chain.clone(), base.metric, values))
}

/// Express balances in another unit: `balances[i] * rates[i]`.
pub fn redenominate(balances: &[f64], rates: &[f64]) -> Vec<f64> {
    balances.iter().zip(rates).map(|(b, r)| b * r).collect()
}

/// Inverse of [`redenominate`]: `values[i] / rates[i]`.
pub fn redenominate_back(values: &[f64], rates: &[f64]) -> Vec<f64> {
    values.iter().zip(rates).map(|(v, r)| v / r).collect()
}

/// Pool value in the numeraire: token A converted at `rate`, token B at face value.
#[inline]
pub fn total_value(token_a_balance: f64, rate: f64, token_b_balance: f64) -> f64 {
    token_a_balance * rate + token_b_balance
}

/// Share price from pool value and supply.
pub fn derived_price(
    chain: &str,
    block_number: u64,
    total_value: f64,
    total_supply: f64,
) -> Result<f64, ReconcileError> {
    if total_supply == 0.0 {
        return Err(ReconcileError::ZeroSupply {
            chain: chain.to_string(),
            block_number,
        });
    }

    validate_finite(total_value / total_supply).ok_or_else(|| ReconcileError::NonFinite {
        chain: chain.to_string(),
        field: "derived_price",
        block_number,
    })
}

/// Build one record per checkpoint.
///
/// Every input must hold exactly one value per checkpoint; alignment is
/// checked before any arithmetic so a failure never leaves partial rows.
pub fn reconcile(
    chain: &str,
    checkpoints: &[Checkpoint],
    inputs: ReconcileInputs<'_>,
) -> Result<Vec<ReconciledRecord>, ReconcileError> {
    inputs.ensure_aligned(checkpoints.len())?;

    let a_in_numeraire = redenominate(&inputs.token_a_balances.values, &inputs.exchange_rates.values);

    checkpoints
        .iter()
        .enumerate()
        .map(|(i, cp)| -> Result<ReconciledRecord, ReconcileError> {
            let token_b_balance = inputs.token_b_balances.values[i];
            let value = a_in_numeraire[i] + token_b_balance;
            let value = validate_finite(value).ok_or_else(|| ReconcileError::NonFinite {
                chain: chain.to_string(),
                field: "total_value",
                block_number: cp.block_number,
            })?;
            let total_supply = inputs.total_supplies.values[i];

            Ok(ReconciledRecord {
                block_number: cp.block_number,
                timestamp: cp.timestamp,
                quoted_price: inputs.quoted_prices.values[i],
                token_a_balance: inputs.token_a_balances.values[i],
                token_b_balance,
                exchange_rate: inputs.exchange_rates.values[i],
                total_supply,
                total_value: value,
                derived_price: derived_price(chain, cp.block_number, value, total_supply)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metric;
    use chrono::DateTime;

    fn checkpoints(blocks: &[u64]) -> Vec<Checkpoint> {
        blocks
            .iter()
            .map(|b| Checkpoint::new("ethereum", *b, DateTime::from_timestamp(1_713_916_800, 0).unwrap()))
            .collect()
    }

    fn series(metric: Metric, values: &[f64]) -> MetricSeries<f64> {
        MetricSeries::new("ethereum", metric, values.to_vec())
    }

    struct Columns {
        quoted: MetricSeries<f64>,
        a: MetricSeries<f64>,
        b: MetricSeries<f64>,
        rate: MetricSeries<f64>,
        supply: MetricSeries<f64>,
    }

    impl Columns {
        fn inputs(&self) -> ReconcileInputs<'_> {
            ReconcileInputs {
                quoted_prices: &self.quoted,
                token_a_balances: &self.a,
                token_b_balances: &self.b,
                exchange_rates: &self.rate,
                total_supplies: &self.supply,
            }
        }
    }

    fn columns(a: &[f64], rate: &[f64], b: &[f64], supply: &[f64]) -> Columns {
        Columns {
            quoted: series(Metric::QuotedPrice, &vec![1.0; a.len()]),
            a: series(Metric::PoolBalances, a),
            b: series(Metric::PoolBalances, b),
            rate: series(Metric::OraclePrice, rate),
            supply: series(Metric::TotalSupply, supply),
        }
    }

    #[test]
    fn test_literal_example() {
        assert_eq!(total_value(100.0, 1.02, 50.0), 152.0);
        let price = derived_price("ethereum", 1, 152.0, 150.0).unwrap();
        assert!((price - 1.013_333_333_333_333).abs() < 1e-12);

        let cols = columns(&[100.0], &[1.02], &[50.0], &[150.0]);
        let records = reconcile("ethereum", &checkpoints(&[1]), cols.inputs()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_value, 152.0);
        assert_eq!(records[0].derived_price, 152.0 / 150.0);
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let cols = columns(
            &[1234.567, 2000.1, 1500.0],
            &[0.9987, 0.9641, 1.0012],
            &[800.2, 950.75, 700.0],
            &[2050.0, 2931.3, 2210.9],
        );
        let cps = checkpoints(&[10, 11, 12]);

        let first = reconcile("ethereum", &cps, cols.inputs()).unwrap();
        let second = reconcile("ethereum", &cps, cols.inputs()).unwrap();
        assert_eq!(first, second);
        for (x, y) in first.iter().zip(&second) {
            assert_eq!(x.derived_price.to_bits(), y.derived_price.to_bits());
        }
    }

    #[test]
    fn test_records_follow_checkpoint_order() {
        let cols = columns(&[1.0, 2.0, 3.0], &[1.0, 1.0, 1.0], &[0.0, 0.0, 0.0], &[1.0, 1.0, 1.0]);
        let cps = checkpoints(&[30, 10, 20]);
        let records = reconcile("ethereum", &cps, cols.inputs()).unwrap();

        let blocks: Vec<u64> = records.iter().map(|r| r.block_number).collect();
        assert_eq!(blocks, vec![30, 10, 20]);
        let prices: Vec<f64> = records.iter().map(|r| r.derived_price).collect();
        assert_eq!(prices, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_zero_supply_is_an_error() {
        let cols = columns(&[1.0, 2.0], &[1.0, 1.0], &[1.0, 1.0], &[1.0, 0.0]);
        let err = reconcile("ethereum", &checkpoints(&[1, 2]), cols.inputs()).unwrap_err();
        assert_eq!(
            err,
            ReconcileError::ZeroSupply {
                chain: "ethereum".to_string(),
                block_number: 2
            }
        );
    }

    #[test]
    fn test_misaligned_input_rejected_before_arithmetic() {
        let mut cols = columns(&[1.0, 2.0], &[1.0, 1.0], &[1.0, 1.0], &[0.0, 0.0]);
        cols.rate = series(Metric::OraclePrice, &[1.0]);

        // Supply is zero everywhere, but alignment is checked first.
        let err = reconcile("ethereum", &checkpoints(&[1, 2]), cols.inputs()).unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::Misaligned { metric: Metric::OraclePrice, expected: 2, actual: 1, .. }
        ));
    }

    #[test]
    fn test_oracle_ratio() {
        let cps = checkpoints(&[1, 2]);
        let ez_eth = series(Metric::OraclePrice, &[0.99, 0.95]);
        let wst_eth = series(Metric::OraclePrice, &[1.16, 1.17]);

        let ratio = oracle_ratio(&cps, &ez_eth, &wst_eth).unwrap();
        assert_eq!(ratio.values, vec![0.99 / 1.16, 0.95 / 1.17]);

        let zero = series(Metric::OraclePrice, &[1.16, 0.0]);
        let err = oracle_ratio(&cps, &ez_eth, &zero).unwrap_err();
        assert!(matches!(err, ReconcileError::ZeroOracleRate { block_number: 2, .. }));
    }

    #[test]
    fn test_redenomination_round_trip() {
        let cps = checkpoints(&[1, 2, 3]);
        let ez_eth = series(Metric::OraclePrice, &[0.9987, 0.9312, 0.9874]);
        let wst_eth = series(Metric::OraclePrice, &[1.1621, 1.1624, 1.1628]);
        let ratio = oracle_ratio(&cps, &ez_eth, &wst_eth).unwrap();

        let balances = vec![1523.77, 1988.02, 1701.5];
        let converted = redenominate(&balances, &ratio.values);
        let restored = redenominate_back(&converted, &ratio.values);

        for (original, back) in balances.iter().zip(&restored) {
            assert!((original - back).abs() <= 1e-9 * original.abs());
        }
    }

    #[test]
    fn test_cross_chain_total_value_uses_ratio() {
        let cps = checkpoints(&[1]);
        let ez_eth = series(Metric::OraclePrice, &[0.98]);
        let wst_eth = series(Metric::OraclePrice, &[1.16]);
        let ratio = oracle_ratio(&cps, &ez_eth, &wst_eth).unwrap();

        let mut cols = columns(&[500.0], &[0.0], &[400.0], &[820.0]);
        cols.rate = ratio;
        let records = reconcile("arbitrum", &cps, cols.inputs()).unwrap();

        let expected_value = 500.0 * (0.98 / 1.16) + 400.0;
        assert_eq!(records[0].total_value, expected_value);
        assert_eq!(records[0].derived_price, expected_value / 820.0);
    }
}
