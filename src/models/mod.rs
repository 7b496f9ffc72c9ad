mod checkpoint;
mod record;
mod series;

pub use checkpoint::{Checkpoint, CheckpointSet};
pub use record::{ChainTable, ReconciledRecord};
pub use series::{BalanceSnapshot, Metric, MetricSeries};
