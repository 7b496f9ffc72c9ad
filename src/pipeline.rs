use std::sync::Arc;
use std::time::Instant;

use log::info;

use crate::client::StateQueryClient;
use crate::config::{ChainSettings, FetcherSettings};
use crate::error::{CheckpointError, PipelineError};
use crate::fetcher::{project_balances, MetricFetchers, RateLimitedFetcher};
use crate::models::{ChainTable, CheckpointSet};
use crate::reconcile::{oracle_ratio, reconcile, ReconcileInputs};

/// Reconstructs one chain's pool series from historical state.
///
/// A run either yields a complete, aligned [`ChainTable`] or fails as a
/// whole: no partially filled table is ever produced. Runs own no shared
/// mutable state, so pipelines of different chains can run concurrently.
pub struct ChainPipeline<C: StateQueryClient + ?Sized> {
    settings: Arc<ChainSettings>,
    fetchers: MetricFetchers<C>,
}

impl<C: StateQueryClient + ?Sized + 'static> ChainPipeline<C> {
    pub fn new(client: Arc<C>, settings: ChainSettings, fetcher_settings: &FetcherSettings) -> Self {
        let settings = Arc::new(settings);
        let fetchers = MetricFetchers::new(
            client,
            settings.clone(),
            RateLimitedFetcher::new(fetcher_settings),
        );

        Self { settings, fetchers }
    }

    pub fn chain(&self) -> &str {
        &self.settings.name
    }

    /// Label of the exchange rate column, e.g. "ezETH/ETH ÷ wstETH/ETH".
    pub fn exchange_rate_label(&self) -> String {
        match &self.settings.quote_oracle {
            Some(quote) => format!("{} ÷ {}", self.settings.base_oracle.pair, quote.pair),
            None => self.settings.base_oracle.pair.clone(),
        }
    }

    pub async fn run(&self, checkpoints: &CheckpointSet) -> Result<ChainTable, PipelineError> {
        let chain = self.chain();
        if checkpoints.chain() != chain {
            return Err(CheckpointError::ForeignChain {
                expected: chain.to_string(),
                found: checkpoints.chain().to_string(),
                block_number: checkpoints
                    .checkpoints()
                    .first()
                    .map(|c| c.block_number)
                    .unwrap_or_default(),
            }
            .into());
        }

        let start = Instant::now();
        let cps = checkpoints.checkpoints();
        info!("[{}] Reconstructing pool state at {} checkpoints", chain, cps.len());

        let pool_id = self
            .fetchers
            .pool_id()
            .await
            .map_err(|reason| PipelineError::PoolId {
                chain: chain.to_string(),
                reason,
            })?;
        info!("[{}] Pool id {}", chain, pool_id);

        // Metrics are fetched one after another through a single fetcher,
        // whose cadence carries over from one batch to the next.
        let quoted_prices = self.fetchers.quoted_prices(cps).await?;
        let snapshots = self.fetchers.pool_balances(cps, pool_id).await?;
        let base_rates = self
            .fetchers
            .oracle_prices(cps, &self.settings.base_oracle)
            .await?;
        let quote_rates = match &self.settings.quote_oracle {
            Some(quote) => Some(self.fetchers.oracle_prices(cps, quote).await?),
            None => None,
        };
        let total_supplies = self.fetchers.total_supplies(cps).await?;

        let (token_a_balances, token_b_balances) = project_balances(
            &snapshots,
            cps,
            self.settings.token_a.address,
            self.settings.token_b.address,
        )?;

        let exchange_rates = match quote_rates {
            Some(quote_rates) => oracle_ratio(cps, &base_rates, &quote_rates)?,
            None => base_rates,
        };

        let records = reconcile(
            chain,
            cps,
            ReconcileInputs {
                quoted_prices: &quoted_prices,
                token_a_balances: &token_a_balances,
                token_b_balances: &token_b_balances,
                exchange_rates: &exchange_rates,
                total_supplies: &total_supplies,
            },
        )?;

        info!(
            "[{}] Reconciled {} records in {:?}",
            chain,
            records.len(),
            start.elapsed()
        );

        Ok(ChainTable {
            chain: chain.to_string(),
            numeraire: self.settings.numeraire.clone(),
            token_a_symbol: self.settings.token_a.symbol.clone(),
            token_b_symbol: self.settings.token_b.symbol.clone(),
            exchange_rate_label: self.exchange_rate_label(),
            records,
        })
    }
}
