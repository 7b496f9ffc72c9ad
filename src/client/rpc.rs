use std::time::Duration;

use alloy::eips::BlockId;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{DynProvider, ProviderBuilder};
use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

use crate::abis::{IAggregatorV3, IComposableStablePool, IVault};
use crate::client::{PoolTokens, RoundData, StateQueryClient};
use crate::config::ChainSettings;

/// `StateQueryClient` over a JSON-RPC endpoint.
///
/// Every historical call is pinned to the requested block and bounded by
/// `timeout`. Archive access is required for blocks outside the node's
/// pruning window.
#[derive(Clone)]
pub struct RpcStateClient {
    chain: String,
    provider: DynProvider,
    timeout: Duration,
}

impl RpcStateClient {
    pub fn new(chain: impl Into<String>, rpc_url: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(rpc_url).context("Invalid RPC URL")?;

        let client = ProviderBuilder::new().connect_http(url);

        Ok(Self {
            chain: chain.into(),
            provider: DynProvider::new(client),
            timeout,
        })
    }

    pub fn from_settings(settings: &ChainSettings) -> Result<Self> {
        Self::new(
            settings.name.clone(),
            &settings.resolved_rpc_url(),
            Duration::from_secs(settings.query_timeout_secs),
        )
        .with_context(|| format!("Failed to build RPC client for {}", settings.name))
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }
}

#[async_trait]
impl StateQueryClient for RpcStateClient {
    async fn get_rate(&self, pool: Address, block: u64) -> Result<U256> {
        let contract = IComposableStablePool::new(pool, &self.provider);
        let call = contract.getRate().block(BlockId::number(block));

        tokio::time::timeout(self.timeout, call.call())
            .await
            .context("getRate timeout")?
            .context("getRate failed")
    }

    async fn get_actual_supply(&self, pool: Address, block: u64) -> Result<U256> {
        let contract = IComposableStablePool::new(pool, &self.provider);
        let call = contract.getActualSupply().block(BlockId::number(block));

        tokio::time::timeout(self.timeout, call.call())
            .await
            .context("getActualSupply timeout")?
            .context("getActualSupply failed")
    }

    async fn get_pool_id(&self, pool: Address) -> Result<B256> {
        let contract = IComposableStablePool::new(pool, &self.provider);

        tokio::time::timeout(self.timeout, contract.getPoolId().call())
            .await
            .context("getPoolId timeout")?
            .context("getPoolId failed")
    }

    async fn get_pool_tokens(&self, vault: Address, pool_id: B256, block: u64) -> Result<PoolTokens> {
        let contract = IVault::new(vault, &self.provider);
        let call = contract.getPoolTokens(pool_id).block(BlockId::number(block));

        let result = tokio::time::timeout(self.timeout, call.call())
            .await
            .context("getPoolTokens timeout")?
            .context("getPoolTokens failed")?;

        Ok(PoolTokens {
            tokens: result.tokens,
            balances: result.balances,
        })
    }

    async fn get_latest_round(&self, oracle: Address, block: u64) -> Result<RoundData> {
        let contract = IAggregatorV3::new(oracle, &self.provider);
        let call = contract.latestRoundData().block(BlockId::number(block));

        let result = tokio::time::timeout(self.timeout, call.call())
            .await
            .context("latestRoundData timeout")?
            .context("latestRoundData failed")?;

        Ok(RoundData {
            round_id: result.roundId.to::<u128>(),
            answer: result.answer,
        })
    }
}
