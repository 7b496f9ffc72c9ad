use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::CheckpointError;

/// A fixed historical position on one chain at which state is queried.
///
/// The timestamp is carried along for display only; every query is keyed
/// by `block_number`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub chain: String,
    pub block_number: u64,
    pub timestamp: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(chain: impl Into<String>, block_number: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            chain: chain.into(),
            block_number,
            timestamp,
        }
    }
}

/// Ordered checkpoints of a single chain.
///
/// Block numbers are unique and the caller's order is kept as-is: every
/// series derived from this set is indexed in the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointSet {
    chain: String,
    checkpoints: Vec<Checkpoint>,
}

impl CheckpointSet {
    pub fn new(chain: impl Into<String>, checkpoints: Vec<Checkpoint>) -> Result<Self, CheckpointError> {
        let chain = chain.into();
        let mut seen = FxHashSet::default();

        for checkpoint in &checkpoints {
            if checkpoint.chain != chain {
                return Err(CheckpointError::ForeignChain {
                    expected: chain,
                    found: checkpoint.chain.clone(),
                    block_number: checkpoint.block_number,
                });
            }
            if !seen.insert(checkpoint.block_number) {
                return Err(CheckpointError::DuplicateBlock {
                    chain,
                    block_number: checkpoint.block_number,
                });
            }
        }

        Ok(Self { chain, checkpoints })
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    pub fn checkpoints(&self) -> &[Checkpoint] {
        &self.checkpoints
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp(chain: &str, block: u64) -> Checkpoint {
        Checkpoint::new(chain, block, DateTime::from_timestamp(1_713_916_800, 0).unwrap())
    }

    #[test]
    fn test_keeps_caller_order() {
        let set = CheckpointSet::new("ethereum", vec![cp("ethereum", 30), cp("ethereum", 10), cp("ethereum", 20)])
            .unwrap();
        let blocks: Vec<u64> = set.checkpoints().iter().map(|c| c.block_number).collect();
        assert_eq!(blocks, vec![30, 10, 20]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_rejects_duplicate_blocks() {
        let err = CheckpointSet::new("ethereum", vec![cp("ethereum", 10), cp("ethereum", 10)]).unwrap_err();
        assert!(matches!(err, CheckpointError::DuplicateBlock { block_number: 10, .. }));
    }

    #[test]
    fn test_rejects_other_chain() {
        let err = CheckpointSet::new("ethereum", vec![cp("arbitrum", 10)]).unwrap_err();
        assert!(matches!(err, CheckpointError::ForeignChain { .. }));
    }
}
