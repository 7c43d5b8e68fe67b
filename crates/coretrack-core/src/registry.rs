//! Indicator registry and dispatch policy.
//!
//! `resolve` is an exhaustive match over [`TrackSpec`], so a new indicator
//! kind fails to compile until it is wired here. `dispatch` applies the
//! uniform policy around every fetcher: same-day cache short-circuit, a
//! bounded time budget, and failure-to-fallback conversion. No fetcher
//! failure of any kind escapes to the orchestrator.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheKey};
use crate::fetchers::{
    AnnualReportWatchFetcher, CommodityPriceFetcher, FetchContext, IndicatorFetcher,
    MarginDividendFetcher, MonthlySalesFetcher, SouthboundFlowFetcher,
};
use crate::{HoldingConfig, TrackSpec};

/// Per-holding dispatch budget. Generous next to the 10 s transport timeout
/// because one fetch may issue a short chain of upstream calls.
const DEFAULT_FETCH_BUDGET: Duration = Duration::from_secs(15);

/// Per-holding outcome: a rendered display line, or the explicit signal to
/// use the holding's static description text. Both arms must be handled at
/// every call site; there is no null state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndicatorResult {
    Rendered(String),
    Fallback,
}

impl IndicatorResult {
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }

    pub fn rendered_text(&self) -> Option<&str> {
        match self {
            Self::Rendered(text) => Some(text),
            Self::Fallback => None,
        }
    }
}

/// Static fetcher table, one implementation per indicator kind.
#[derive(Debug, Default)]
pub struct FetcherRegistry {
    southbound: SouthboundFlowFetcher,
    annual_report: AnnualReportWatchFetcher,
    monthly_sales: MonthlySalesFetcher,
    margin_dividend: MarginDividendFetcher,
    commodity: CommodityPriceFetcher,
}

impl FetcherRegistry {
    /// Map a track spec to its fetcher. `None` (including every degraded
    /// unknown tag) resolves to no fetcher at all: nothing to invoke,
    /// nothing to cache.
    pub fn resolve(&self, spec: &TrackSpec) -> Option<&dyn IndicatorFetcher> {
        match spec {
            TrackSpec::SouthboundFlow => Some(&self.southbound),
            TrackSpec::AnnualReportWatch { .. } => Some(&self.annual_report),
            TrackSpec::MonthlySales { .. } => Some(&self.monthly_sales),
            TrackSpec::MarginDividend => Some(&self.margin_dividend),
            TrackSpec::CommodityPrice { .. } => Some(&self.commodity),
            TrackSpec::None => None,
        }
    }
}

/// Applies cache, budget, and fallback policy uniformly around fetchers.
pub struct Dispatcher {
    registry: FetcherRegistry,
    ctx: Arc<FetchContext>,
    budget: Duration,
}

impl Dispatcher {
    pub fn new(ctx: Arc<FetchContext>) -> Self {
        Self {
            registry: FetcherRegistry::default(),
            ctx,
            budget: DEFAULT_FETCH_BUDGET,
        }
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    pub fn context(&self) -> &FetchContext {
        &self.ctx
    }

    /// Produce one holding's indicator outcome. Infallible by design: every
    /// failure path collapses into [`IndicatorResult::Fallback`].
    pub async fn dispatch(&self, holding: &HoldingConfig) -> IndicatorResult {
        let Some(fetcher) = self.registry.resolve(&holding.track) else {
            return IndicatorResult::Fallback;
        };

        let kind = fetcher.kind();
        let key = CacheKey::new(holding.code.clone(), kind, self.ctx.today).render();

        if let Some(entry) = self.ctx.cache.get(&key) {
            debug!(code = %holding.code, %kind, "cache hit; skipping fetch");
            return IndicatorResult::Rendered(entry.rendered_text);
        }

        match tokio::time::timeout(self.budget, fetcher.fetch(holding, &self.ctx)).await {
            Ok(Ok(text)) => {
                // A failed write only costs a refetch tomorrow.
                if let Err(error) = self.ctx.cache.put(&key, CacheEntry::new(text.clone())) {
                    warn!(code = %holding.code, %kind, %error, "failed to cache indicator");
                }
                IndicatorResult::Rendered(text)
            }
            Ok(Err(error)) => {
                warn!(code = %holding.code, %kind, %error, "indicator fetch failed; using fallback");
                IndicatorResult::Fallback
            }
            Err(_) => {
                warn!(
                    code = %holding.code,
                    %kind,
                    budget_secs = self.budget.as_secs(),
                    "indicator fetch timed out; using fallback"
                );
                IndicatorResult::Fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::data_source::{
        Announcement, AnnouncementQuery, AnnouncementSource, FlowSnapshot, FlowSource,
        SourceError, SourceId,
    };
    use crate::fetchers::AdapterSet;
    use crate::{CacheStore, IndicatorKind, MarketDay, StockCode};

    struct CountingFlow {
        calls: AtomicUsize,
        result: Result<FlowSnapshot, SourceError>,
    }

    impl CountingFlow {
        fn ok(latest_net: f64, five_day_net: f64) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Ok(FlowSnapshot {
                    trade_date: MarketDay::parse("2026-08-06").expect("valid day"),
                    latest_net,
                    five_day_net,
                }),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Err(SourceError::unavailable("simulated outage")),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl FlowSource for CountingFlow {
        fn id(&self) -> SourceId {
            SourceId::Eastmoney
        }

        fn southbound_flow<'a>(
            &'a self,
        ) -> Pin<Box<dyn Future<Output = Result<FlowSnapshot, SourceError>> + Send + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = self.result.clone();
            Box::pin(async move { result })
        }
    }

    struct CountingAnnouncements {
        calls: AtomicUsize,
    }

    impl AnnouncementSource for CountingAnnouncements {
        fn id(&self) -> SourceId {
            SourceId::Cninfo
        }

        fn search<'a>(
            &'a self,
            _query: AnnouncementQuery,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<Announcement>, SourceError>> + Send + 'a>>
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(Vec::new()) })
        }
    }

    fn holding(track: TrackSpec) -> HoldingConfig {
        HoldingConfig {
            code: StockCode::parse("513180").expect("valid code"),
            name: String::from("恒生科技ETF"),
            note: String::from("港股科技仓位"),
            track,
        }
    }

    fn dispatcher_with_flow(
        dir: &tempfile::TempDir,
        flow: Arc<CountingFlow>,
    ) -> Dispatcher {
        let mut adapters = AdapterSet::offline();
        adapters.flow = flow;
        let ctx = FetchContext::new(
            adapters,
            Arc::new(CacheStore::open(dir.path().join("cache.json"))),
            MarketDay::parse("2026-08-07").expect("valid day"),
        );
        Dispatcher::new(Arc::new(ctx))
    }

    #[tokio::test]
    async fn none_kind_never_calls_an_adapter() {
        let dir = tempfile::tempdir().expect("tempdir");
        let announcements = Arc::new(CountingAnnouncements {
            calls: AtomicUsize::new(0),
        });
        let flow = Arc::new(CountingFlow::ok(1.0, 2.0));

        let mut adapters = AdapterSet::offline();
        adapters.flow = flow.clone();
        adapters.announcements = announcements.clone();
        let ctx = FetchContext::new(
            adapters,
            Arc::new(CacheStore::open(dir.path().join("cache.json"))),
            MarketDay::parse("2026-08-07").expect("valid day"),
        );
        let dispatcher = Dispatcher::new(Arc::new(ctx));

        let result = dispatcher.dispatch(&holding(TrackSpec::None)).await;

        assert!(result.is_fallback());
        assert_eq!(flow.calls(), 0);
        assert_eq!(announcements.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn same_day_redispatch_hits_the_cache() {
        let dir = tempfile::tempdir().expect("tempdir");
        let flow = Arc::new(CountingFlow::ok(12.34, -6.7));
        let dispatcher = dispatcher_with_flow(&dir, flow.clone());
        let holding = holding(TrackSpec::SouthboundFlow);

        let first = dispatcher.dispatch(&holding).await;
        let second = dispatcher.dispatch(&holding).await;

        assert_eq!(first, second);
        assert_eq!(
            first.rendered_text(),
            Some("南向资金: 昨日净流入+12.3亿 | 近5日累计-6.7亿")
        );
        assert_eq!(flow.calls(), 1);
    }

    #[tokio::test]
    async fn adapter_failure_becomes_fallback_and_is_not_cached() {
        let dir = tempfile::tempdir().expect("tempdir");
        let flow = Arc::new(CountingFlow::failing());
        let dispatcher = dispatcher_with_flow(&dir, flow.clone());
        let holding = holding(TrackSpec::SouthboundFlow);

        assert!(dispatcher.dispatch(&holding).await.is_fallback());
        // Failures are retried on the next dispatch, not frozen for the day.
        assert!(dispatcher.dispatch(&holding).await.is_fallback());
        assert_eq!(flow.calls(), 2);
    }

    #[tokio::test]
    async fn slow_fetcher_times_out_to_fallback() {
        struct StallingFlow;

        impl FlowSource for StallingFlow {
            fn id(&self) -> SourceId {
                SourceId::Eastmoney
            }

            fn southbound_flow<'a>(
                &'a self,
            ) -> Pin<Box<dyn Future<Output = Result<FlowSnapshot, SourceError>> + Send + 'a>>
            {
                Box::pin(async move {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Err(SourceError::unavailable("never reached"))
                })
            }
        }

        let dir = tempfile::tempdir().expect("tempdir");
        let mut adapters = AdapterSet::offline();
        adapters.flow = Arc::new(StallingFlow);
        let ctx = FetchContext::new(
            adapters,
            Arc::new(CacheStore::open(dir.path().join("cache.json"))),
            MarketDay::parse("2026-08-07").expect("valid day"),
        );
        let dispatcher =
            Dispatcher::new(Arc::new(ctx)).with_budget(Duration::from_millis(20));

        let result = dispatcher.dispatch(&holding(TrackSpec::SouthboundFlow)).await;
        assert!(result.is_fallback());
    }

    #[tokio::test]
    async fn every_registered_kind_resolves() {
        let registry = FetcherRegistry::default();
        let specs = [
            TrackSpec::SouthboundFlow,
            TrackSpec::AnnualReportWatch {
                expected_date: String::from("3/20"),
            },
            TrackSpec::MonthlySales {
                keyword: String::from("产销快报"),
            },
            TrackSpec::MarginDividend,
            TrackSpec::CommodityPrice {
                commodities: vec![String::from("玉米")],
            },
        ];

        for spec in &specs {
            let fetcher = registry.resolve(spec).expect("kind must resolve");
            assert_eq!(fetcher.kind(), spec.kind());
        }
        assert!(registry.resolve(&TrackSpec::None).is_none());
    }

    #[test]
    fn indicator_kind_matches_cache_key_shape() {
        let key = CacheKey::new(
            StockCode::parse("513180").expect("valid code"),
            IndicatorKind::SouthboundFlow,
            MarketDay::parse("2026-08-07").expect("valid day"),
        );
        assert_eq!(key.render(), "513180:southbound_flow:2026-08-07");
    }
}
