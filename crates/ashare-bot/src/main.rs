//! A-share execution bot entry point.
//!
//! Loads the day's universe from TOML, wires the executor to the simulated
//! broker, and runs until the execute window closes.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use ashare_broker::SimBroker;
use ashare_exec::Executor;

/// A-share trading-execution bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via ASHARE_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    ashare_bot::init_logging()?;

    info!("starting ashare-bot v{}", env!("CARGO_PKG_VERSION"));

    let config = match args.config.or_else(|| std::env::var("ASHARE_CONFIG").ok()) {
        Some(path) => {
            info!(config_path = %path, "loading configuration");
            ashare_bot::AppConfig::from_file(&path)?
        }
        None => ashare_bot::AppConfig::load()?,
    };

    info!(
        trading_day = %config.trading_day(),
        buy_cap = config.buy_cap,
        candidates = config.candidates.len(),
        holdings = config.holdings.len(),
        "configuration loaded"
    );

    let broker = Arc::new(SimBroker::new());
    broker.set_capital(config.capital);

    let executor = Arc::new(Executor::new(
        config.executor_config(),
        config.candidates(),
        config.holdings(),
        broker.clone(),
        broker.clone(),
        broker.clone(),
    ));
    broker.attach_quote_sink(executor.clone());
    broker.attach_fill_sink(executor.clone());

    executor.run().await?;

    info!("ashare-bot finished");
    Ok(())
}
