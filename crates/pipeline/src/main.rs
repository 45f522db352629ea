//! Signal pipeline binary
//!
//! Usage: `signal-pipeline [config.toml]`. Values may be overridden with
//! `PIPELINE_*` environment variables.

use anyhow::Context;
use pipeline::{init_logging, Pipeline, PipelineConfig};
use std::path::PathBuf;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = PipelineConfig::load(path.as_deref()).context("loading configuration")?;
    init_logging(&config.log_level, config.log_json)?;

    info!("=== Signal Pipeline v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "{} channel(s) at {} Hz, {} s windows every {} s, running {} s",
        config.channel_count,
        config.producer_rate_hz,
        config.consumer_window_s,
        config.consumer_period_s,
        config.run_duration_s
    );

    let pipeline = Pipeline::new(config)?;
    let summary = pipeline.run()?;

    info!(
        "Done in {:.2?}: {} windows, {} samples delivered, {} undelivered, {} evicted",
        summary.elapsed,
        summary.counters.windows_consumed,
        summary.counters.samples_consumed,
        summary.undelivered,
        summary.evicted
    );
    Ok(())
}
