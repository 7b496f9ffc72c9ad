use std::str::FromStr;

use alloy::primitives::{Address, B256};
use config::{Config, ConfigError, Environment, File};
use log::LevelFilter;
use serde::Deserialize;

/// Concurrency and pacing of historical state queries.
///
/// `pacing_ms` is the fixed delay between two submissions, which caps the
/// sustained request rate at roughly `1000 / pacing_ms` per second no matter
/// how many workers are available.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FetcherSettings {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            pacing_ms: default_pacing_ms(),
        }
    }
}

fn default_workers() -> usize {
    7
}

fn default_pacing_ms() -> u64 {
    140
}

/// Where the checkpoint export lives on disk.
#[derive(Debug, Deserialize, Clone)]
pub struct CheckpointSettings {
    pub path: String,
}

/// Output settings for the reconciled tables.
#[derive(Debug, Deserialize, Clone)]
pub struct ReportSettings {
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

fn default_out_dir() -> String {
    "reports".to_string()
}

/// A pool constituent token.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TokenSettings {
    pub symbol: String,
    pub address: Address,
}

/// A price feed exposing `latestRoundData()`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OracleSettings {
    /// Pair label, e.g. "ezETH/ETH"
    pub pair: String,
    pub address: Address,
    #[serde(default = "default_oracle_decimals")]
    pub decimals: u8,
}

fn default_oracle_decimals() -> u8 {
    18
}

/// Everything needed to reconstruct one chain's pool series.
///
/// `token_a` is converted into the numeraire through the oracle rate,
/// `token_b` is already numeraire-denominated. When `quote_oracle` is set the
/// exchange rate becomes `base_oracle / quote_oracle`, re-denominating token A
/// from the oracles' common unit into token B.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChainSettings {
    /// Must match the `blockchain` column of the checkpoint export
    pub name: String,
    pub rpc_url: String,
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    pub pool: Address,
    pub vault: Address,
    /// Skips the `getPoolId()` lookup when set
    #[serde(default)]
    pub pool_id: Option<B256>,
    pub numeraire: String,
    pub token_a: TokenSettings,
    pub token_b: TokenSettings,
    pub base_oracle: OracleSettings,
    #[serde(default)]
    pub quote_oracle: Option<OracleSettings>,
}

fn default_query_timeout_secs() -> u64 {
    30
}

impl ChainSettings {
    /// RPC URL with `${VAR}` placeholders substituted from the environment.
    ///
    /// Substituted values are not scanned again. Unset variables are left
    /// untouched so the provider fails with a recognizable URL instead of an
    /// empty one.
    pub fn resolved_rpc_url(&self) -> String {
        let mut url = String::with_capacity(self.rpc_url.len());
        let mut rest = self.rpc_url.as_str();

        while let Some(start) = rest.find("${") {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let placeholder = &rest[start..=start + len];
            let name = &placeholder[2..placeholder.len() - 1];

            url.push_str(&rest[..start]);
            match std::env::var(name) {
                Ok(value) => url.push_str(&value),
                Err(_) => url.push_str(placeholder),
            }
            rest = &rest[start + len + 1..];
        }

        url.push_str(rest);
        url
    }
}

/// Root application configuration.
///
/// Loaded from `config.{yaml,toml,json}` at startup, with `POOLSCOPE__`
/// prefixed environment variables taking precedence.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub fetcher: FetcherSettings,
    pub checkpoints: CheckpointSettings,
    #[serde(default)]
    pub report: ReportSettings,
    pub chains: Vec<ChainSettings>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .add_source(Environment::with_prefix("POOLSCOPE").separator("__"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }

    /// `log_level` as a filter, `None` if it names no level.
    pub fn log_filter(&self) -> Option<LevelFilter> {
        LevelFilter::from_str(self.log_level.trim()).ok()
    }

    pub fn chain(&self, name: &str) -> Option<&ChainSettings> {
        self.chains.iter().find(|c| c.name == name)
    }
}
