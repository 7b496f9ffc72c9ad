use std::sync::Arc;

use alloy::primitives::{Address, B256};
use anyhow::Result;
use log::warn;

use crate::client::{PoolTokens, StateQueryClient};
use crate::config::{ChainSettings, OracleSettings};
use crate::error::{FetchError, PipelineError};
use crate::fetcher::RateLimitedFetcher;
use crate::models::{BalanceSnapshot, Checkpoint, Metric, MetricSeries};
use crate::utils::{i256_to_f64_safe, u256_to_f64_safe, validate_oracle_rate, FIXED_POINT_DECIMALS};

/// The four per-metric specializations of [`RateLimitedFetcher`] for one chain.
///
/// Each one supplies the remote query and the decoding/scaling step. Query
/// failures are logged and become missing values; the fetcher then fails the
/// batch.
pub struct MetricFetchers<C: StateQueryClient + ?Sized> {
    client: Arc<C>,
    settings: Arc<ChainSettings>,
    fetcher: RateLimitedFetcher,
}

impl<C: StateQueryClient + ?Sized + 'static> MetricFetchers<C> {
    pub fn new(client: Arc<C>, settings: Arc<ChainSettings>, fetcher: RateLimitedFetcher) -> Self {
        Self {
            client,
            settings,
            fetcher,
        }
    }

    pub fn chain(&self) -> &str {
        &self.settings.name
    }

    /// Vault pool id, from configuration or `getPoolId()` at the latest block.
    pub async fn pool_id(&self) -> Result<B256> {
        if let Some(pool_id) = self.settings.pool_id {
            return Ok(pool_id);
        }
        self.client.get_pool_id(self.settings.pool).await
    }

    /// Pool-reported price: `getRate() / 1e18`.
    pub async fn quoted_prices(&self, checkpoints: &[Checkpoint]) -> Result<MetricSeries<f64>, FetchError> {
        let client = self.client.clone();
        let pool = self.settings.pool;
        let chain = self.chain().to_string();

        self.fetcher
            .fetch_all(self.chain(), Metric::QuotedPrice, checkpoints, move |cp| {
                let client = client.clone();
                let chain = chain.clone();
                let block = cp.block_number;
                async move {
                    match client.get_rate(pool, block).await {
                        Ok(raw) => u256_to_f64_safe(raw, FIXED_POINT_DECIMALS),
                        Err(e) => {
                            log_missing(&chain, Metric::QuotedPrice, block, &e);
                            None
                        },
                    }
                }
            })
            .await
    }

    /// Vault balances of every pool token: `raw / 1e18` keyed by token address.
    pub async fn pool_balances(
        &self,
        checkpoints: &[Checkpoint],
        pool_id: B256,
    ) -> Result<MetricSeries<BalanceSnapshot>, FetchError> {
        let client = self.client.clone();
        let vault = self.settings.vault;
        let chain = self.chain().to_string();

        self.fetcher
            .fetch_all(self.chain(), Metric::PoolBalances, checkpoints, move |cp| {
                let client = client.clone();
                let chain = chain.clone();
                let block = cp.block_number;
                async move {
                    match client.get_pool_tokens(vault, pool_id, block).await {
                        Ok(pool_tokens) => decode_snapshot(&chain, block, pool_tokens),
                        Err(e) => {
                            log_missing(&chain, Metric::PoolBalances, block, &e);
                            None
                        },
                    }
                }
            })
            .await
    }

    /// Oracle exchange rate: `latestRoundData().answer / 10^decimals`.
    pub async fn oracle_prices(
        &self,
        checkpoints: &[Checkpoint],
        oracle: &OracleSettings,
    ) -> Result<MetricSeries<f64>, FetchError> {
        let client = self.client.clone();
        let address = oracle.address;
        let decimals = oracle.decimals;
        let chain = self.chain().to_string();

        self.fetcher
            .fetch_all(self.chain(), Metric::OraclePrice, checkpoints, move |cp| {
                let client = client.clone();
                let chain = chain.clone();
                let block = cp.block_number;
                async move {
                    match client.get_latest_round(address, block).await {
                        Ok(round) => {
                            let rate = i256_to_f64_safe(round.answer, decimals)
                                .and_then(validate_oracle_rate);
                            if rate.is_none() {
                                warn!(
                                    "[{}] Oracle {} answered unusable rate {} in round {} at block {}",
                                    chain, address, round.answer, round.round_id, block
                                );
                            }
                            rate
                        },
                        Err(e) => {
                            log_missing(&chain, Metric::OraclePrice, block, &e);
                            None
                        },
                    }
                }
            })
            .await
    }

    /// Outstanding share supply: `getActualSupply() / 1e18`.
    pub async fn total_supplies(&self, checkpoints: &[Checkpoint]) -> Result<MetricSeries<f64>, FetchError> {
        let client = self.client.clone();
        let pool = self.settings.pool;
        let chain = self.chain().to_string();

        self.fetcher
            .fetch_all(self.chain(), Metric::TotalSupply, checkpoints, move |cp| {
                let client = client.clone();
                let chain = chain.clone();
                let block = cp.block_number;
                async move {
                    match client.get_actual_supply(pool, block).await {
                        Ok(raw) => u256_to_f64_safe(raw, FIXED_POINT_DECIMALS),
                        Err(e) => {
                            log_missing(&chain, Metric::TotalSupply, block, &e);
                            None
                        },
                    }
                }
            })
            .await
    }
}

fn log_missing(chain: &str, metric: Metric, block: u64, err: &anyhow::Error) {
    warn!("[{}] No {} at block {}: {:#}", chain, metric, block, err);
}

fn decode_snapshot(chain: &str, block: u64, pool_tokens: PoolTokens) -> Option<BalanceSnapshot> {
    if pool_tokens.tokens.len() != pool_tokens.balances.len() {
        warn!(
            "[{}] getPoolTokens at block {} returned {} tokens but {} balances",
            chain,
            block,
            pool_tokens.tokens.len(),
            pool_tokens.balances.len()
        );
        return None;
    }

    pool_tokens
        .tokens
        .into_iter()
        .zip(pool_tokens.balances)
        .map(|(token, raw)| u256_to_f64_safe(raw, FIXED_POINT_DECIMALS).map(|b| (token, b)))
        .collect()
}

/// Split balance snapshots into one series per configured token.
///
/// The tokens are expected in every historical snapshot of the pool; an
/// absent key is a fatal error, never a zero balance.
pub fn project_balances(
    snapshots: &MetricSeries<BalanceSnapshot>,
    checkpoints: &[Checkpoint],
    token_a: Address,
    token_b: Address,
) -> Result<(MetricSeries<f64>, MetricSeries<f64>), PipelineError> {
    snapshots.ensure_aligned(checkpoints.len())?;

    let mut balances_a = Vec::with_capacity(checkpoints.len());
    let mut balances_b = Vec::with_capacity(checkpoints.len());

    for (snapshot, checkpoint) in snapshots.values.iter().zip(checkpoints) {
        for (token, out) in [(token_a, &mut balances_a), (token_b, &mut balances_b)] {
            let balance = snapshot
                .balance_of(&token)
                .ok_or_else(|| PipelineError::MissingToken {
                    chain: snapshots.chain.clone(),
                    token,
                    block_number: checkpoint.block_number,
                })?;
            out.push(balance);
        }
    }

    Ok((
        MetricSeries::new(snapshots.chain.clone(), Metric::PoolBalances, balances_a),
        MetricSeries::new(snapshots.chain.clone(), Metric::PoolBalances, balances_b),
    ))
}
