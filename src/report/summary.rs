use anyhow::Result;
use log::{info, warn};

use crate::models::ChainTable;
use crate::report::ReportSink;

/// Logs a short comparison of quoted and derived prices.
#[derive(Debug, Default)]
pub struct LogReportSink;

impl ReportSink for LogReportSink {
    fn emit(&self, table: &ChainTable) -> Result<()> {
        let (Some(first), Some(last)) = (table.records.first(), table.records.last()) else {
            warn!("[{}] Empty table, nothing to report", table.chain);
            return Ok(());
        };

        info!(
            "[{}] {} records, {}/{} pool priced in {} using {}",
            table.chain,
            table.len(),
            table.token_a_symbol,
            table.token_b_symbol,
            table.numeraire,
            table.exchange_rate_label
        );
        info!(
            "[{}] quoted {:.6} -> {:.6}, derived {:.6} -> {:.6}",
            table.chain, first.quoted_price, last.quoted_price, first.derived_price, last.derived_price
        );

        if let Some(max) = table.max_divergence() {
            info!("[{}] max |quoted - derived| = {:.6}", table.chain, max);
        }
        Ok(())
    }
}
