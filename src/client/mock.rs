//! In-memory `StateQueryClient` for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy::primitives::{Address, B256, I256, U256};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::client::{PoolTokens, RoundData, StateQueryClient};

const WAD: u128 = 1_000_000_000_000_000_000;

/// Convert a decimal to an 18-decimal fixed-point integer.
pub fn wad(value: f64) -> U256 {
    U256::from((value * WAD as f64).round() as u128)
}

pub fn wad_signed(value: f64) -> I256 {
    I256::from_raw(wad(value))
}

/// Canned per-block answers with optional latency and failures.
///
/// Any block without a canned answer reverts.
#[derive(Default)]
pub struct MockStateClient {
    pool_id: B256,
    rates: FxHashMap<u64, U256>,
    supplies: FxHashMap<u64, U256>,
    pool_tokens: FxHashMap<u64, PoolTokens>,
    rounds: FxHashMap<(Address, u64), RoundData>,
    delays: FxHashMap<u64, Duration>,
    failing_blocks: FxHashSet<u64>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
    call_times: Mutex<Vec<tokio::time::Instant>>,
}

impl MockStateClient {
    pub fn new(pool_id: B256) -> Self {
        Self {
            pool_id,
            ..Default::default()
        }
    }

    pub fn with_rate(mut self, block: u64, rate: f64) -> Self {
        self.rates.insert(block, wad(rate));
        self
    }

    pub fn with_supply(mut self, block: u64, supply: f64) -> Self {
        self.supplies.insert(block, wad(supply));
        self
    }

    pub fn with_balances(mut self, block: u64, balances: &[(Address, f64)]) -> Self {
        self.pool_tokens.insert(
            block,
            PoolTokens {
                tokens: balances.iter().map(|(t, _)| *t).collect(),
                balances: balances.iter().map(|(_, b)| wad(*b)).collect(),
            },
        );
        self
    }

    pub fn with_raw_pool_tokens(mut self, block: u64, pool_tokens: PoolTokens) -> Self {
        self.pool_tokens.insert(block, pool_tokens);
        self
    }

    pub fn with_round(mut self, oracle: Address, block: u64, answer: f64) -> Self {
        self.rounds.insert(
            (oracle, block),
            RoundData {
                round_id: block as u128,
                answer: wad_signed(answer),
            },
        );
        self
    }

    pub fn with_raw_round(mut self, oracle: Address, block: u64, answer: I256) -> Self {
        self.rounds.insert(
            (oracle, block),
            RoundData {
                round_id: block as u128,
                answer,
            },
        );
        self
    }

    /// Delay every answer for `block`.
    pub fn with_delay(mut self, block: u64, delay: Duration) -> Self {
        self.delays.insert(block, delay);
        self
    }

    /// Make every query at `block` fail, whatever the metric.
    pub fn failing_at(mut self, block: u64) -> Self {
        self.failing_blocks.insert(block);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Start instants of every counted call, in arrival order.
    pub fn call_times(&self) -> Vec<tokio::time::Instant> {
        self.call_times.lock().unwrap().clone()
    }

    async fn answer<T: Clone>(&self, block: u64, found: Option<&T>, what: &str) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times.lock().unwrap().push(tokio::time::Instant::now());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&block) {
            tokio::time::sleep(*delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_blocks.contains(&block) {
            return Err(anyhow!("{} at block {}: connection reset", what, block));
        }
        found
            .cloned()
            .ok_or_else(|| anyhow!("{} at block {}: execution reverted", what, block))
    }
}

#[async_trait]
impl StateQueryClient for MockStateClient {
    async fn get_rate(&self, _pool: Address, block: u64) -> Result<U256> {
        self.answer(block, self.rates.get(&block), "getRate").await
    }

    async fn get_actual_supply(&self, _pool: Address, block: u64) -> Result<U256> {
        self.answer(block, self.supplies.get(&block), "getActualSupply")
            .await
    }

    async fn get_pool_id(&self, _pool: Address) -> Result<B256> {
        Ok(self.pool_id)
    }

    async fn get_pool_tokens(&self, _vault: Address, pool_id: B256, block: u64) -> Result<PoolTokens> {
        if pool_id != self.pool_id {
            return Err(anyhow!("getPoolTokens: invalid pool id"));
        }
        self.answer(block, self.pool_tokens.get(&block), "getPoolTokens")
            .await
    }

    async fn get_latest_round(&self, oracle: Address, block: u64) -> Result<RoundData> {
        self.answer(block, self.rounds.get(&(oracle, block)), "latestRoundData")
            .await
    }
}
