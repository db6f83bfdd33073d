//! econdash CLI: download indicator series and derive the yield spread.
//!
//! With no arguments the compiled-in indicator list is fetched into `public/`.
//! The exit code is 0 whenever the run itself started; per-indicator and
//! spread failures only show up as console notices.
//!
//! `econdash correlate` reads the files a previous run wrote and ranks every
//! pair of series by sample correlation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use econdash_core::data::{SeriesStore, StdoutProgress, YahooProvider};
use econdash_core::{RunConfig, SeriesId};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "econdash",
    about = "econdash: end-of-day indicator snapshots and the 10Y-13W spread"
)]
struct Cli {
    /// Destination directory for the CSV files. Must already exist.
    #[arg(long, global = true)]
    dest: Option<PathBuf>,

    /// TOML file replacing the compiled-in indicator list.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Skip the yield spread step.
    #[arg(long, default_value_t = false)]
    skip_spread: bool,

    /// Print debug diagnostics to stderr.
    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank pairs of saved series by correlation on shared dates.
    Correlate {
        /// File stems to compare (e.g. Gold,USDJPY). Defaults to every
        /// configured series.
        #[arg(long, value_delimiter = ',')]
        series: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => RunConfig::builtin().context("compiled-in configuration is invalid")?,
    };

    if let Some(dest) = cli.dest {
        config.dest_dir = dest;
    }
    if cli.skip_spread {
        config.spread = None;
    }

    if !config.dest_dir.is_dir() {
        warn!(dest = %config.dest_dir.display(), "destination directory does not exist");
    }

    match cli.command {
        Some(Commands::Correlate { series }) => run_correlate(&config, &series),
        None => {
            let provider =
                YahooProvider::new().context("failed to set up Yahoo Finance client")?;
            econdash_core::run(&config, &provider, &StdoutProgress);
            Ok(())
        }
    }
}

fn run_correlate(config: &RunConfig, series: &[String]) -> Result<()> {
    let ids: Vec<SeriesId> = if series.is_empty() {
        config.series_ids()
    } else {
        series.iter().map(SeriesId::new).collect()
    };

    let store = SeriesStore::new(&config.dest_dir);
    let matrix = econdash_core::correlate(&store, &ids);

    println!("Correlation across {} series", matrix.len());
    for pair in matrix.ranked_pairs() {
        println!(
            "{:>7.3}  {} & {}",
            pair.value,
            pair.first.stem(),
            pair.second.stem()
        );
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
