//! Indicator fetchers, one per [`IndicatorKind`].
//!
//! A fetcher transforms raw adapter data into the holding's one-line display
//! summary. Fetchers never decide fallback policy themselves: they return
//! `Result<String, SourceError>` and the dispatcher converts any failure
//! into the fallback sentinel.

mod annual_report;
mod commodity;
mod margin_dividend;
mod monthly_sales;
mod southbound;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use annual_report::AnnualReportWatchFetcher;
pub use commodity::CommodityPriceFetcher;
pub use margin_dividend::MarginDividendFetcher;
pub use monthly_sales::MonthlySalesFetcher;
pub use southbound::SouthboundFlowFetcher;

use crate::cache::CacheStore;
use crate::data_source::{AnnouncementSource, FlowSource, SnapshotProvider, SourceError};
use crate::routing::CommodityRouter;
use crate::{HoldingConfig, IndicatorKind, MarketDay};

/// Every data boundary a fetcher may touch, bundled for dispatch.
pub struct AdapterSet {
    pub flow: Arc<dyn FlowSource>,
    pub announcements: Arc<dyn AnnouncementSource>,
    pub commodities: CommodityRouter,
    pub snapshots: Arc<dyn SnapshotProvider>,
}

impl AdapterSet {
    /// Deterministic no-network set: every adapter sits on the no-op
    /// transport and the quote board/snapshot tables start empty. Used by
    /// offline runs and as the base for test doubles.
    pub fn offline() -> Self {
        use crate::adapters::{
            CninfoAnnouncementAdapter, EastmoneyFlowAdapter, QuoteBoardAdapter,
            SinaFuturesAdapter, StaticSnapshots,
        };

        Self {
            flow: Arc::new(EastmoneyFlowAdapter::default()),
            announcements: Arc::new(CninfoAnnouncementAdapter::default()),
            commodities: CommodityRouter::new(
                Arc::new(SinaFuturesAdapter::default()),
                Arc::new(QuoteBoardAdapter::default()),
            ),
            snapshots: Arc::new(StaticSnapshots::default()),
        }
    }
}

/// Per-run context shared by all fetchers.
pub struct FetchContext {
    pub adapters: AdapterSet,
    pub cache: Arc<CacheStore>,
    /// Calendar day the whole run keys against; fixed once at startup so a
    /// run straddling midnight stays coherent.
    pub today: MarketDay,
}

impl FetchContext {
    pub fn new(adapters: AdapterSet, cache: Arc<CacheStore>, today: MarketDay) -> Self {
        Self {
            adapters,
            cache,
            today,
        }
    }
}

/// Capability "produce one display line" for a single indicator kind.
pub trait IndicatorFetcher: Send + Sync {
    fn kind(&self) -> IndicatorKind;

    /// Produce the holding's rendered indicator line.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the line cannot be produced; the
    /// dispatcher turns that into the fallback sentinel and logs it.
    fn fetch<'a>(
        &'a self,
        holding: &'a HoldingConfig,
        ctx: &'a FetchContext,
    ) -> Pin<Box<dyn Future<Output = Result<String, SourceError>> + Send + 'a>>;
}
