//! # Coretrack Core
//!
//! Per-holding "core indicator" tracking for the daily portfolio report.
//!
//! ## Overview
//!
//! Each configured holding names one indicator worth watching daily: the
//! southbound capital flow behind a Hong Kong ETF, the annual-report
//! disclosure state of a growth position, the monthly sales bulletin of a
//! turnaround bet, a bank's net interest margin, or the spot prices of the
//! commodities a cyclical producer sells. This crate fetches, renders, and
//! caches that one line per holding, and guarantees that a broken data
//! source degrades a single holding to its static description instead of
//! breaking the report.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Eastmoney, cninfo, Sina futures, quote board) |
//! | [`cache`] | Same-day on-disk indicator cache |
//! | [`circuit_breaker`] | Circuit breaker for repeated upstream failures |
//! | [`config`] | Portfolio file loading with degrade-to-none policy |
//! | [`data_source`] | Adapter contracts and source error taxonomy |
//! | [`domain`] | Domain types (StockCode, MarketDay, TrackSpec, ...) |
//! | [`fetchers`] | One fetcher per indicator kind |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`registry`] | Fetcher registry and dispatch policy |
//! | [`routing`] | Commodity source chain with fallback |
//! | [`runner`] | Per-run orchestration |
//!
//! ## Flow
//!
//! ```text
//! ┌──────────────┐
//! │ Orchestrator │  configured order in, configured order out
//! └──────┬───────┘
//!        ▼
//! ┌──────────────┐     ┌─────────────┐
//! │  Dispatcher  │────▶│ Cache Store │  same-day short-circuit
//! └──────┬───────┘     └─────────────┘
//!        ▼
//! ┌──────────────┐     ┌─────────────┐
//! │   Fetcher    │────▶│  Adapters   │──▶ upstream APIs
//! └──────────────┘     └─────────────┘
//! ```
//!
//! Every failure on the way down is converted to the fallback sentinel on
//! the way up; the report always completes for every holding.

pub mod adapters;
pub mod cache;
pub mod circuit_breaker;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod fetchers;
pub mod http_client;
pub mod registry;
pub mod routing;
pub mod runner;

// Re-export commonly used types at crate root for convenience

// Adapter implementations
pub use adapters::{
    CninfoAnnouncementAdapter, EastmoneyFlowAdapter, QuoteBoardAdapter, SinaFuturesAdapter,
    StaticSnapshots,
};

// Caching
pub use cache::{CacheEntry, CacheError, CacheKey, CacheStore};

// Circuit breaker
pub use circuit_breaker::{CircuitBreaker, CircuitState};

// Configuration
pub use config::PortfolioConfig;

// Data source contracts
pub use data_source::{
    Announcement, AnnouncementQuery, AnnouncementSource, CommoditySource, FinancialSnapshot,
    FlowSnapshot, FlowSource, PricePoint, SnapshotProvider, SourceError, SourceErrorKind, SourceId,
};

// Domain types
pub use domain::{
    HoldingConfig, IndicatorKind, MarketDay, RawCoreTrack, StockCode, TrackSpec, UtcDateTime,
    DEFAULT_SALES_KEYWORD,
};

// Error types
pub use error::{ConfigError, ValidationError};

// Fetchers
pub use fetchers::{AdapterSet, FetchContext, IndicatorFetcher};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient};

// Registry and dispatch
pub use registry::{Dispatcher, FetcherRegistry, IndicatorResult};

// Routing
pub use routing::{CommodityQuote, CommodityRouter};

// Runner
pub use runner::{HoldingIndicator, Orchestrator};
