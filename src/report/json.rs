use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::models::ChainTable;
use crate::report::ReportSink;

/// Writes each table to `{out_dir}/{chain}.json`.
pub struct JsonReportSink {
    out_dir: PathBuf,
}

impl JsonReportSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn path_for(&self, chain: &str) -> PathBuf {
        self.out_dir.join(format!("{}.json", chain))
    }

    fn write(&self, path: &Path, table: &ChainTable) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), table)?;
        Ok(())
    }
}

impl ReportSink for JsonReportSink {
    fn emit(&self, table: &ChainTable) -> Result<()> {
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("Failed to create {}", self.out_dir.display()))?;

        let path = self.path_for(&table.chain);
        self.write(&path, table)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(
            "[{}] Wrote {} records to {}",
            table.chain,
            table.len(),
            path.display()
        );
        Ok(())
    }
}
