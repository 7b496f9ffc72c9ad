//! Consumers of reconciled chain tables.
//!
//! Tables are handed over by value once a run completes; sinks never see a
//! partial table.

mod json;
mod summary;

use anyhow::Result;

use crate::models::ChainTable;

pub use json::JsonReportSink;
pub use summary::LogReportSink;

pub trait ReportSink {
    fn emit(&self, table: &ChainTable) -> Result<()>;
}

/// Fans one table out to several sinks, stopping at the first failure.
pub struct CompositeSink {
    sinks: Vec<Box<dyn ReportSink + Send + Sync>>,
}

impl CompositeSink {
    pub fn new(sinks: Vec<Box<dyn ReportSink + Send + Sync>>) -> Self {
        Self { sinks }
    }
}

impl ReportSink for CompositeSink {
    fn emit(&self, table: &ChainTable) -> Result<()> {
        for sink in &self.sinks {
            sink.emit(table)?;
        }
        Ok(())
    }
}
