use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::data_source::{PricePoint, SourceError};
use crate::fetchers::{FetchContext, IndicatorFetcher};
use crate::{HoldingConfig, IndicatorKind, TrackSpec};

/// Trailing window for the "近1月" change figure.
const CHANGE_WINDOW_DAYS: i64 = 30;

/// A series must reach back at least this far before a change figure is
/// shown at all; a shorter history would compare against an arbitrary
/// recent sample and mislead.
const MIN_CHANGE_LOOKBACK_DAYS: i64 = 15;

/// Per-commodity placeholder when every source comes up empty for one name.
fn placeholder(commodity: &str) -> String {
    format!("{commodity}: 暂无数据")
}

/// Product-price line for cyclical holdings: latest price and trailing
/// one-month change per configured commodity, joined into a single line.
#[derive(Debug, Default)]
pub struct CommodityPriceFetcher;

impl CommodityPriceFetcher {
    /// Render one commodity segment from a non-empty ascending series.
    ///
    /// The reference sample is the one nearest to (latest − 30 days); an
    /// exact-day match is not required, and ties resolve to the older
    /// sample. A series without enough history renders price-only.
    fn render_segment(commodity: &str, series: &[PricePoint]) -> String {
        let Some(latest) = series.last() else {
            return placeholder(commodity);
        };

        let lookback = latest
            .date
            .days_since(series.first().map(|p| p.date).unwrap_or(latest.date));
        if lookback < MIN_CHANGE_LOOKBACK_DAYS {
            return format!("{commodity}: {:.0}元/吨", latest.close);
        }

        let target = latest.date.minus_days(CHANGE_WINDOW_DAYS);
        let mut reference = latest;
        let mut best_distance = i64::MAX;
        for point in series {
            let distance = point.date.days_since(target).abs();
            if distance < best_distance {
                best_distance = distance;
                reference = point;
            }
        }

        if reference.close <= 0.0 || reference.date == latest.date {
            return format!("{commodity}: {:.0}元/吨", latest.close);
        }

        let change_pct = (latest.close - reference.close) / reference.close * 100.0;
        format!(
            "{commodity}: {:.0}元/吨(近1月{change_pct:+.1}%)",
            latest.close
        )
    }
}

impl IndicatorFetcher for CommodityPriceFetcher {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::CommodityPrice
    }

    fn fetch<'a>(
        &'a self,
        holding: &'a HoldingConfig,
        ctx: &'a FetchContext,
    ) -> Pin<Box<dyn Future<Output = Result<String, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let TrackSpec::CommodityPrice { commodities } = &holding.track else {
                return Err(SourceError::internal(
                    "holding is not configured for commodity tracking",
                ));
            };

            let mut segments = Vec::with_capacity(commodities.len());
            let mut resolved = 0usize;

            for commodity in commodities {
                match ctx.adapters.commodities.spot_series(commodity).await {
                    Ok(quote) => {
                        segments.push(Self::render_segment(commodity, &quote.series));
                        resolved += 1;
                    }
                    Err(error) => {
                        // One dead commodity must not drop the whole line.
                        debug!(code = %holding.code, commodity, %error, "commodity unresolved");
                        segments.push(placeholder(commodity));
                    }
                }
            }

            if resolved == 0 {
                return Err(SourceError::unavailable(format!(
                    "none of the {} configured commodities could be priced",
                    commodities.len()
                )));
            }

            Ok(segments.join(" | "))
        })
    }
}
