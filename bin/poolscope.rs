use std::sync::Arc;

use anyhow::Context;
use jemallocator::Jemalloc;
use log::{error, info, warn, LevelFilter};
use simple_logger::SimpleLogger;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use poolscope::{
    models::ChainTable,
    report::{CompositeSink, JsonReportSink, LogReportSink, ReportSink},
    ChainPipeline, CheckpointSource, PipelineError, RpcStateClient, Settings,
};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    // The logger passes everything; the global max level does the filtering
    // so it can be changed once the configuration is known.
    SimpleLogger::new()
        .with_level(LevelFilter::Trace)
        .init()
        .context("Failed to initialize logger")?;
    log::set_max_level(LevelFilter::Info);

    // Load configuration
    let settings = Settings::new()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))
        .context("Failed to load config file. Please ensure config.yaml exists and is valid")?;

    match settings.log_filter() {
        Some(level) => log::set_max_level(level),
        None => warn!(
            "Unknown log_level {:?}, keeping info",
            settings.log_level
        ),
    }

    let mut checkpoints = CheckpointSource::new(&settings.checkpoints.path)
        .load_by_chain()
        .context("Failed to load checkpoints")?;

    // One independent run per configured chain; they share nothing but the runtime.
    let mut runs = Vec::with_capacity(settings.chains.len());
    for chain in &settings.chains {
        let Some(set) = checkpoints.remove(&chain.name) else {
            warn!("No checkpoints for chain {}, skipping", chain.name);
            continue;
        };

        let client = Arc::new(RpcStateClient::from_settings(chain)?);
        let pipeline = ChainPipeline::new(client, chain.clone(), &settings.fetcher);

        runs.push(async move {
            let result = pipeline.run(&set).await;
            (pipeline.chain().to_string(), result)
        });
    }

    for chain in checkpoints.keys() {
        warn!("Checkpoints for unconfigured chain {} ignored", chain);
    }

    info!(
        "Running {} chain pipeline(s) with {} workers and {}ms pacing",
        runs.len(),
        settings.fetcher.workers,
        settings.fetcher.pacing_ms
    );

    let results = futures::future::join_all(runs).await;

    let sink = CompositeSink::new(vec![
        Box::new(LogReportSink),
        Box::new(JsonReportSink::new(&settings.report.out_dir)),
    ]);

    let failed = report_results(results, &sink);
    if failed > 0 {
        anyhow::bail!("{} chain run(s) failed", failed);
    }

    info!("All chain runs completed");
    Ok(())
}

fn report_results(
    results: Vec<(String, Result<ChainTable, PipelineError>)>,
    sink: &dyn ReportSink,
) -> usize {
    let mut failed = 0;

    for (chain, result) in results {
        match result {
            Ok(table) => {
                if let Err(e) = sink.emit(&table) {
                    error!("[{}] Failed to report results: {:#}", chain, e);
                    failed += 1;
                }
            },
            Err(e) => {
                error!("[{}] Run aborted: {}", chain, e);
                failed += 1;
            },
        }
    }

    failed
}
