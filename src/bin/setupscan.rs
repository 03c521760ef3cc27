//! setupscan - run setup strategies over a Finam CSV export
//!
//! Prints JSON to stdout; logs go to stderr.
//!
//! ```text
//! setupscan --list
//! setupscan --csv export.csv
//! setupscan --csv export.csv --strategy turtle_breakout
//! setupscan --csv export.csv --config setupscan.toml -v
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use setupscan::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "setupscan")]
#[command(about = "Scan candle exports for trade setups", long_about = None)]
#[command(version)]
struct Cli {
    /// Finam-style semicolon CSV export
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Scanner config (TOML); defaults to every builtin setup
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single strategy instead of all of them
    #[arg(short, long)]
    strategy: Option<String>,

    /// List registered strategies and exit
    #[arg(long)]
    list: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_registry(config: Option<&PathBuf>) -> Result<StrategyRegistry> {
    match config {
        Some(path) => {
            let config = ScannerConfig::load(path)
                .with_context(|| format!("Failed to load config '{}'", path.display()))?;
            Ok(StrategyRegistry::from_config(&config)?)
        }
        None => Ok(RegistryBuilder::new().with_all_defaults().build()?),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let registry = build_registry(cli.config.as_ref())?;

    if cli.list {
        println!("{}", serde_json::to_string_pretty(&registry.metadata())?);
        return Ok(());
    }

    let Some(csv_path) = cli.csv else {
        bail!("--csv is required unless --list is given");
    };
    let tickers = load_finam_csv(&csv_path)
        .with_context(|| format!("Failed to read candles from '{}'", csv_path.display()))?;
    info!(tickers = tickers.len(), path = %csv_path.display(), "Loaded candles");

    let output = match cli.strategy {
        Some(name) => {
            if registry.get(&name).is_none() {
                bail!(ScanError::UnknownStrategy(name));
            }
            let results = registry.analyze_all(&name, &tickers);
            let signals: usize = results.values().map(Vec::len).sum();
            info!(strategy = %name, signals, "Scan finished");
            serde_json::to_string_pretty(&BTreeMap::from_iter(results))?
        }
        None => {
            let results: BTreeMap<_, _> = registry
                .analyze_everything(&tickers)
                .into_iter()
                .map(|(name, per_ticker)| (name, BTreeMap::from_iter(per_ticker)))
                .collect();
            info!(strategies = results.len(), "Scan finished");
            serde_json::to_string_pretty(&results)?
        }
    };

    println!("{output}");
    Ok(())
}
