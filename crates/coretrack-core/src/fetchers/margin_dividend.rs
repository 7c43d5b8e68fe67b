use std::future::Future;
use std::pin::Pin;

use crate::data_source::SourceError;
use crate::fetchers::{FetchContext, IndicatorFetcher};
use crate::{HoldingConfig, IndicatorKind};

/// Bank-holding passthrough: net interest margin and valuation from the
/// already-fetched financial snapshot. This fetcher never touches the
/// network; the figures arrive from the external quote/fundamentals engine.
#[derive(Debug, Default)]
pub struct MarginDividendFetcher;

impl MarginDividendFetcher {
    fn render(net_interest_margin: f64, pe_ratio: Option<f64>) -> String {
        let pe = match pe_ratio {
            Some(pe) => format!("{pe:.1}"),
            None => String::from("--"),
        };
        format!("净息差: {net_interest_margin:.2}% | PE: {pe} | 待年报分红方案")
    }
}

impl IndicatorFetcher for MarginDividendFetcher {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::MarginDividend
    }

    fn fetch<'a>(
        &'a self,
        holding: &'a HoldingConfig,
        ctx: &'a FetchContext,
    ) -> Pin<Box<dyn Future<Output = Result<String, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let snapshot = ctx
                .adapters
                .snapshots
                .snapshot(&holding.code)
                .ok_or_else(|| {
                    SourceError::malformed(format!(
                        "no financial snapshot available for {}",
                        holding.code
                    ))
                })?;

            let nim = snapshot.net_interest_margin.ok_or_else(|| {
                SourceError::malformed(format!(
                    "snapshot for {} carries no net interest margin",
                    holding.code
                ))
            })?;

            Ok(Self::render(nim, snapshot.pe_ratio))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::StaticSnapshots;
    use crate::data_source::FinancialSnapshot;
    use crate::fetchers::AdapterSet;
    use crate::{CacheStore, MarketDay, StockCode, TrackSpec, UtcDateTime};

    fn holding() -> HoldingConfig {
        HoldingConfig {
            code: StockCode::parse("600036").expect("valid code"),
            name: String::from("招商银行"),
            note: String::from("高股息底仓"),
            track: TrackSpec::MarginDividend,
        }
    }

    fn context(dir: &tempfile::TempDir, snapshots: StaticSnapshots) -> FetchContext {
        let mut adapters = AdapterSet::offline();
        adapters.snapshots = Arc::new(snapshots);
        FetchContext::new(
            adapters,
            Arc::new(CacheStore::open(dir.path().join("cache.json"))),
            MarketDay::parse("2026-03-20").expect("valid day"),
        )
    }

    fn snapshot(nim: Option<f64>, pe: Option<f64>) -> FinancialSnapshot {
        FinancialSnapshot {
            code: StockCode::parse("600036").expect("valid code"),
            net_interest_margin: nim,
            pe_ratio: pe,
            dividend_yield: Some(0.052),
            as_of: UtcDateTime::now(),
        }
    }

    #[tokio::test]
    async fn renders_margin_and_pe_from_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(
            &dir,
            StaticSnapshots::new(vec![snapshot(Some(1.54), Some(6.23))]),
        );

        let line = MarginDividendFetcher
            .fetch(&holding(), &ctx)
            .await
            .expect("must render");
        assert_eq!(line, "净息差: 1.54% | PE: 6.2 | 待年报分红方案");
    }

    #[tokio::test]
    async fn missing_pe_renders_a_dash() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&dir, StaticSnapshots::new(vec![snapshot(Some(1.54), None)]));

        let line = MarginDividendFetcher
            .fetch(&holding(), &ctx)
            .await
            .expect("must render");
        assert_eq!(line, "净息差: 1.54% | PE: -- | 待年报分红方案");
    }

    #[tokio::test]
    async fn missing_snapshot_errors_for_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&dir, StaticSnapshots::default());

        let err = MarginDividendFetcher
            .fetch(&holding(), &ctx)
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), crate::data_source::SourceErrorKind::Malformed);
    }

    #[tokio::test]
    async fn missing_margin_errors_for_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = context(&dir, StaticSnapshots::new(vec![snapshot(None, Some(6.2))]));

        assert!(MarginDividendFetcher.fetch(&holding(), &ctx).await.is_err());
    }
}
