//! # Memcached Monitor - Main Entry Point
//!
//! Each collection cycle:
//!
//! 1. Resolves the configured servers
//! 2. Requests `STAT` from every server concurrently, bounded by the configured timeout
//! 3. Translates the stats of every reachable server into metrics
//! 4. Prints one metric line per value on stdout
//! 5. Optionally renders tables and exports the cycle as JSON
//!
//! Without `--interval` a single cycle runs and the exit status reflects it.

use clap::Parser;
use color_eyre::Result;
use eyre::{
    eyre,
    Context as _,
};
use memcached_monitor_config::{
    Args,
    MonitorConfig,
};
use memcached_stats_gatherer::{
    emitter::LineEmitter,
    BinaryProtocolClient,
    Collector,
    CycleContext,
    MemcachedCollector,
};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{
    error,
    info,
};
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
    Layer,
};

fn init_logging(verbose: bool) -> Result<()> {
    color_eyre::install()?;
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "memcached_stats_gatherer={level},memcached_monitor={level},memcached_monitor_config={level}"
        ))
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_filter(filter))
        .with(tracing_error::ErrorLayer::default())
        .try_init()
        .context("Failed to initialize tracing subscriber")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose)?;

    info!("Using Monitor Version [{}]", env!("CARGO_PKG_VERSION"));

    let config = MonitorConfig::load(&args.config, &args)?;
    config.validate()?;
    let interval = args.interval.as_deref().map(parse_duration).transpose()?;

    let mut collector = MemcachedCollector::new(config, BinaryProtocolClient::default());

    let Some(period) = interval else {
        return run_cycle(&mut collector, &args, CycleContext::numbered(1)).await;
    };

    info!(?period, "Collecting periodically");
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycle = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                return Ok(());
            }
        }
        cycle += 1;
        // The next tick runs regardless of how this one ended.
        if let Err(error) = run_cycle(&mut collector, &args, CycleContext::numbered(cycle)).await {
            error!("{error:#}");
        }
    }
}

async fn run_cycle(
    collector: &mut MemcachedCollector<BinaryProtocolClient>,
    args: &Args,
    ctx: CycleContext,
) -> Result<()> {
    info!(cycle = %ctx, "Starting the Memcached Monitoring task.");

    if let Err(error) = collector.collect(ctx).await {
        error!(%error, "Metrics collection failed");
        return Err(eyre!("Memcached monitoring task completed with failures."));
    }

    let emitted = collector.emit(&mut LineEmitter::stdout())?;

    if args.table {
        println!("{}", collector.format());
    }

    if let Some(output_file) = &args.output_file {
        let json_string = serde_json::to_string_pretty(&collector.summary())?;
        tokio::fs::write(output_file, json_string)
            .await
            .wrap_err_with(|| format!("Failed to write {}", output_file.display()))?;
        info!("Data exported successfully to {}", output_file.display());
    }

    info!(emitted, "Memcached monitoring task completed successfully.");
    Ok(())
}

fn parse_duration(duration_str: &str) -> Result<Duration> {
    let duration =
        humantime::parse_duration(duration_str).map_err(|e| eyre!("Invalid interval '{}': {}", duration_str, e))?;
    if duration.is_zero() {
        return Err(eyre!("Invalid interval '{}': must be greater than zero", duration_str));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn interval_parses_human_durations() {
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("1500ms").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn interval_rejects_zero_and_garbage() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("soon").is_err());
    }
}
