use alloy::primitives::Address;
use thiserror::Error;

use crate::models::Metric;

/// Batch-level failures of the rate-limited fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(
        "incomplete {metric} series on {chain}: {missing} of {total} checkpoints returned no value \
         (first at index {index}, block {block_number})"
    )]
    Incomplete {
        chain: String,
        metric: Metric,
        index: usize,
        block_number: u64,
        missing: usize,
        total: usize,
    },

    #[error("{metric} worker on {chain} for block {block_number} did not complete: {source}")]
    Worker {
        chain: String,
        metric: Metric,
        block_number: u64,
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Arithmetic and alignment failures of the reconciliation step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconcileError {
    #[error("{metric} series on {chain} has {actual} values for {expected} checkpoints")]
    Misaligned {
        chain: String,
        metric: Metric,
        expected: usize,
        actual: usize,
    },

    #[error("zero total supply on {chain} at block {block_number}")]
    ZeroSupply { chain: String, block_number: u64 },

    #[error("zero quote oracle rate on {chain} at block {block_number}")]
    ZeroOracleRate { chain: String, block_number: u64 },

    #[error("non-finite {field} on {chain} at block {block_number}")]
    NonFinite {
        chain: String,
        field: &'static str,
        block_number: u64,
    },
}

/// Problems with the checkpoint input table.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("duplicate block {block_number} in {chain} checkpoints")]
    DuplicateBlock { chain: String, block_number: u64 },

    #[error("checkpoint for block {block_number} belongs to {found}, not {expected}")]
    ForeignChain {
        expected: String,
        found: String,
        block_number: u64,
    },

    #[error("invalid timestamp '{value}' for block {block_number}")]
    InvalidTimestamp { value: String, block_number: u64 },

    #[error("failed to read checkpoint export: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse checkpoint export: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Anything that aborts a chain's pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Checkpoints(#[from] CheckpointError),

    #[error("token {token} missing from {chain} balance snapshot at block {block_number}")]
    MissingToken {
        chain: String,
        token: Address,
        block_number: u64,
    },

    #[error("failed to resolve pool id on {chain}: {reason:#}")]
    PoolId { chain: String, reason: anyhow::Error },
}

impl PipelineError {
    /// Whether the failure came from data the remote endpoint could not
    /// provide, as opposed to bad input or arithmetic.
    pub fn is_completeness_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::Fetch(FetchError::Incomplete { .. }) | PipelineError::MissingToken { .. }
        )
    }
}
