mod cli;
mod error;
mod output;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use coretrack_core::{
    AdapterSet, CacheStore, CninfoAnnouncementAdapter, CommodityRouter, Dispatcher,
    EastmoneyFlowAdapter, FetchContext, FinancialSnapshot, HttpClient, MarketDay, NoopHttpClient,
    Orchestrator, PortfolioConfig, QuoteBoardAdapter, ReqwestHttpClient, SinaFuturesAdapter,
    StaticSnapshots,
};

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    init_logging();

    if let Err(error) = run(Cli::parse()).await {
        eprintln!("error: {error}");
        std::process::exit(error.exit_code());
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let portfolio = PortfolioConfig::load(&cli.portfolio)?;
    let cache = Arc::new(CacheStore::open(&cli.cache));
    let today = MarketDay::today();

    if cli.prune_cache {
        match cache.prune_before(today) {
            Ok(dropped) if dropped > 0 => tracing::info!(dropped, "pruned stale cache entries"),
            Ok(_) => {}
            Err(error) => warn!(%error, "cache prune failed; continuing"),
        }
    }

    let snapshots = load_snapshots(&cli)?;
    let adapters = build_adapters(&cli, snapshots);

    let ctx = FetchContext::new(adapters, cache, today);
    let dispatcher =
        Dispatcher::new(Arc::new(ctx)).with_budget(Duration::from_secs(cli.timeout_secs));

    let results = Orchestrator::new(Arc::new(dispatcher))
        .with_concurrency(cli.concurrency)
        .run(&portfolio.holdings)
        .await;

    output::render(&results, cli.output.as_deref())
}

fn load_snapshots(cli: &Cli) -> Result<Vec<FinancialSnapshot>, CliError> {
    let Some(path) = &cli.snapshots else {
        return Ok(Vec::new());
    };

    let raw = std::fs::read_to_string(path)
        .map_err(|error| CliError::Snapshots(error.to_string()))?;
    serde_json::from_str(&raw).map_err(|error| CliError::Snapshots(error.to_string()))
}

fn build_adapters(cli: &Cli, snapshots: Vec<FinancialSnapshot>) -> AdapterSet {
    let http: Arc<dyn HttpClient> = if cli.offline {
        Arc::new(NoopHttpClient)
    } else {
        Arc::new(ReqwestHttpClient::new())
    };

    AdapterSet {
        flow: Arc::new(EastmoneyFlowAdapter::with_http_client(Arc::clone(&http))),
        announcements: Arc::new(CninfoAnnouncementAdapter::with_http_client(Arc::clone(
            &http,
        ))),
        commodities: CommodityRouter::new(
            Arc::new(SinaFuturesAdapter::with_http_client(http)),
            Arc::new(QuoteBoardAdapter::open(&cli.quotes)),
        ),
        snapshots: Arc::new(StaticSnapshots::new(snapshots)),
    }
}
