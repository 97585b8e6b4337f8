//! Replay a synthetic tick sequence through the imbalance strategy.
//!
//! Usage: `replay [config.json]`. Set `RUST_LOG=debug` for per-tick output.

use algo_backtest::{BacktestSimulator, ImbalanceStrategy};
use algo_core::{Config, Level, Tick};
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

const TICKS: u64 = 120;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(&path).with_context(|| format!("loading config {path}"))?,
        None => Config::default(),
    };
    config.validate()?;
    info!(?config, "starting replay");

    let strategy = ImbalanceStrategy::new(config.strategy.clone(), config.book.imbalance_depth);
    let mut simulator = BacktestSimulator::with_config(config.simulator.clone(), strategy);

    let ticks = synthetic_ticks(TICKS)?;
    let summary = simulator.run(ticks);

    info!(
        orders = summary.orders_created,
        filled = summary.total_filled_quantity,
        vwap = ?summary.vwap,
        fill_rate = summary.fill_rate(),
        "replay finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

/// Two-level book drifting around 10_000 with alternating depth pressure.
fn synthetic_ticks(count: u64) -> Result<Vec<Tick>> {
    (1..=count)
        .map(|seq| {
            let step = seq as i64;
            let mid = 10_000 + (step % 20 - 10).abs();
            let pressure = (step % 7) * 40;
            let bids = [
                Level::new(mid - 1, 100 + pressure),
                Level::new(mid - 2, 150),
            ];
            let asks = [
                Level::new(mid + 1, 340 - pressure),
                Level::new(mid + 2, 150),
            ];
            Tick::new(seq, step * 250, bids, asks).context("building synthetic tick")
        })
        .collect()
}
