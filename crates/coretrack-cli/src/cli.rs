use std::path::PathBuf;

use clap::Parser;

/// Daily per-holding core-indicator batch.
#[derive(Debug, Parser)]
#[command(name = "coretrack", version, about = "Fetch per-holding core indicators for the daily report")]
pub struct Cli {
    /// Portfolio configuration file.
    #[arg(long, default_value = "portfolio.json")]
    pub portfolio: PathBuf,

    /// Indicator cache file, shared across runs.
    #[arg(long, default_value = "data/indicator_cache.json")]
    pub cache: PathBuf,

    /// Commodity quotation-board file (secondary price source).
    #[arg(long, default_value = "data/commodity_prices.json")]
    pub quotes: PathBuf,

    /// Financial snapshot handover file from the quote engine (JSON array).
    #[arg(long)]
    pub snapshots: Option<PathBuf>,

    /// Maximum holdings fetching at once.
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Per-holding fetch budget in seconds.
    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,

    /// Run without touching the network; cache and local files only.
    #[arg(long)]
    pub offline: bool,

    /// Drop cache entries from previous days before running.
    #[arg(long)]
    pub prune_cache: bool,

    /// Write assembled lines to a file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}
