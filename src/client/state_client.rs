use alloy::primitives::{Address, B256, I256, U256};
use anyhow::Result;
use async_trait::async_trait;

/// Raw `getPoolTokens` answer of the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolTokens {
    pub tokens: Vec<Address>,
    pub balances: Vec<U256>,
}

/// The parts of an oracle's `latestRoundData` answer the pipeline uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundData {
    pub round_id: u128,
    pub answer: I256,
}

/// Read-only access to a chain's contract state as of a historical block.
///
/// One method per query the pipeline issues. Implementations own transport,
/// authentication and per-call timeouts; any failure (network, decode,
/// revert, timeout) surfaces as an `Err` which callers treat as "no value".
#[async_trait]
pub trait StateQueryClient: Send + Sync {
    /// Pool-reported rate (`getRate`), 18-decimal fixed point.
    async fn get_rate(&self, pool: Address, block: u64) -> Result<U256>;

    /// Outstanding share supply (`getActualSupply`), 18-decimal fixed point.
    async fn get_actual_supply(&self, pool: Address, block: u64) -> Result<U256>;

    /// Vault pool id (`getPoolId`) at the latest state.
    async fn get_pool_id(&self, pool: Address) -> Result<B256>;

    /// Registered tokens and raw balances (`getPoolTokens`).
    async fn get_pool_tokens(&self, vault: Address, pool_id: B256, block: u64) -> Result<PoolTokens>;

    /// Latest oracle round (`latestRoundData`).
    async fn get_latest_round(&self, oracle: Address, block: u64) -> Result<RoundData>;
}
