//! Checkpoint input from the analytics query export.
//!
//! The export is a JSON array of rows, one per (chain, interval):
//!
//! ```json
//! [{ "blockchain": "ethereum", "block_number": 19720000, "interval_time": "2024-04-24 00:00:00.000 UTC" }]
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use log::info;
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::CheckpointError;
use crate::models::{Checkpoint, CheckpointSet};

#[derive(Debug, Deserialize)]
struct CheckpointRow {
    blockchain: String,
    block_number: u64,
    interval_time: String,
}

/// Reads checkpoint rows from a saved query export.
#[derive(Debug, Clone)]
pub struct CheckpointSource {
    path: PathBuf,
}

impl CheckpointSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All rows in file order.
    pub fn load(&self) -> Result<Vec<Checkpoint>, CheckpointError> {
        let raw = std::fs::read_to_string(&self.path)?;
        let checkpoints = parse_rows(&raw)?;

        info!(
            "Loaded {} checkpoints from {}",
            checkpoints.len(),
            self.path.display()
        );
        Ok(checkpoints)
    }

    /// Rows partitioned by chain, each chain keeping the file order.
    pub fn load_by_chain(&self) -> Result<FxHashMap<String, CheckpointSet>, CheckpointError> {
        partition_by_chain(self.load()?)
    }
}

/// Parse a JSON export into checkpoints.
pub fn parse_rows(raw: &str) -> Result<Vec<Checkpoint>, CheckpointError> {
    let rows: Vec<CheckpointRow> = serde_json::from_str(raw)?;

    rows.into_iter()
        .map(|row| -> Result<Checkpoint, CheckpointError> {
            let timestamp = parse_timestamp(&row.interval_time).ok_or_else(|| {
                CheckpointError::InvalidTimestamp {
                    value: row.interval_time.clone(),
                    block_number: row.block_number,
                }
            })?;
            Ok(Checkpoint::new(row.blockchain, row.block_number, timestamp))
        })
        .collect()
}

/// Split rows by chain identifier without reordering them.
pub fn partition_by_chain(
    checkpoints: Vec<Checkpoint>,
) -> Result<FxHashMap<String, CheckpointSet>, CheckpointError> {
    let mut grouped: FxHashMap<String, Vec<Checkpoint>> = FxHashMap::default();
    for checkpoint in checkpoints {
        grouped
            .entry(checkpoint.chain.clone())
            .or_default()
            .push(checkpoint);
    }

    grouped
        .into_iter()
        .map(|(chain, rows)| -> Result<(String, CheckpointSet), CheckpointError> {
            let set = CheckpointSet::new(chain.clone(), rows)?;
            Ok((chain, set))
        })
        .collect()
}

/// Accepts RFC3339 and the export's `YYYY-MM-DD HH:MM:SS[.fff] UTC` form.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }

    let trimmed = value.trim().trim_end_matches("UTC").trim_end();
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
