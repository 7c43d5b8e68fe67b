use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::data_source::SourceError;
use crate::fetchers::{FetchContext, IndicatorFetcher};
use crate::{HoldingConfig, IndicatorKind};

/// Southbound connect capital-flow line for Hong Kong themed ETFs.
#[derive(Debug, Default)]
pub struct SouthboundFlowFetcher;

impl SouthboundFlowFetcher {
    fn render(latest_net: f64, five_day_net: f64) -> String {
        format!("南向资金: 昨日净流入{latest_net:+.1}亿 | 近5日累计{five_day_net:+.1}亿")
    }
}

impl IndicatorFetcher for SouthboundFlowFetcher {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::SouthboundFlow
    }

    fn fetch<'a>(
        &'a self,
        holding: &'a HoldingConfig,
        ctx: &'a FetchContext,
    ) -> Pin<Box<dyn Future<Output = Result<String, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let snapshot = ctx.adapters.flow.southbound_flow().await?;

            // Weekends and holidays publish nothing new; the latest session
            // on record is still the right figure to show.
            if snapshot.trade_date != ctx.today {
                debug!(
                    code = %holding.code,
                    trade_date = %snapshot.trade_date,
                    "no session today; showing most recent southbound figures"
                );
            }

            Ok(Self::render(snapshot.latest_net, snapshot.five_day_net))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_sign_and_one_decimal_exactly() {
        assert_eq!(
            SouthboundFlowFetcher::render(12.34, -6.7),
            "南向资金: 昨日净流入+12.3亿 | 近5日累计-6.7亿"
        );
    }

    #[test]
    fn zero_flow_renders_with_explicit_plus() {
        assert_eq!(
            SouthboundFlowFetcher::render(0.0, 0.04),
            "南向资金: 昨日净流入+0.0亿 | 近5日累计+0.0亿"
        );
    }
}
