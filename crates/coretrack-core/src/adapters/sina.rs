use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::data_source::{CommoditySource, PricePoint, SourceError, SourceId};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::MarketDay;

const KLINE_URL: &str =
    "https://stock2.finance.sina.com.cn/futures/api/jsonp.php/var%20_kline=/InnerFuturesNewService.getDailyKLine";

/// Commodities with a listed dominant contract on the mainland futures
/// exchanges, mapped to their Sina continuous-contract symbols. Everything
/// else (specialty chemicals and the like) has no futures quote and must
/// come from the secondary quote board.
const CONTRACT_MAP: [(&str, &str); 3] = [("玉米", "C0"), ("豆粕", "M0"), ("棉花", "CF0")];

/// Sina futures daily-kline client, the primary commodity price source.
#[derive(Clone)]
pub struct SinaFuturesAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl Default for SinaFuturesAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
        }
    }
}

impl SinaFuturesAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }

    fn contract_symbol(commodity: &str) -> Option<&'static str> {
        CONTRACT_MAP
            .iter()
            .find(|(name, _)| *name == commodity)
            .map(|(_, symbol)| *symbol)
    }

    fn kline_endpoint(symbol: &str) -> String {
        format!("{KLINE_URL}?symbol={}", urlencoding::encode(symbol))
    }

    /// The endpoint answers JSONP: `var _kline=([{...},...]);`. Strip the
    /// wrapper down to the bracketed array before deserializing.
    fn parse_kline(body: &str) -> Result<Vec<PricePoint>, SourceError> {
        let start = body.find('(');
        let end = body.rfind(')');
        let payload = match (start, end) {
            (Some(start), Some(end)) if start < end => &body[start + 1..end],
            _ => body,
        };

        let rows: Vec<KlineRow> = serde_json::from_str(payload.trim()).map_err(|e| {
            SourceError::malformed(format!("failed to parse futures kline response: {e}"))
        })?;

        let mut series = Vec::with_capacity(rows.len());
        for row in rows {
            let date = MarketDay::parse(&row.d).map_err(|_| {
                SourceError::malformed(format!("unparsable kline date '{}'", row.d))
            })?;
            let close = row.c.parse::<f64>().map_err(|_| {
                SourceError::malformed(format!("unparsable kline close '{}'", row.c))
            })?;
            series.push(PricePoint { date, close });
        }

        series.sort_by_key(|point| point.date);
        Ok(series)
    }
}

impl CommoditySource for SinaFuturesAdapter {
    fn id(&self) -> SourceId {
        SourceId::SinaFutures
    }

    fn covers(&self, commodity: &str) -> bool {
        Self::contract_symbol(commodity).is_some()
    }

    fn spot_series<'a>(
        &'a self,
        commodity: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PricePoint>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let Some(symbol) = Self::contract_symbol(commodity) else {
                return Err(SourceError::no_coverage(SourceId::SinaFutures, commodity));
            };

            let request = HttpRequest::get(Self::kline_endpoint(symbol));
            let response = self.http_client.execute(request).await.map_err(|e| {
                SourceError::unavailable(format!("sina futures transport error: {}", e.message()))
            })?;

            if !response.is_success() {
                return Err(SourceError::unavailable(format!(
                    "sina futures returned status {}",
                    response.status
                )));
            }

            Self::parse_kline(&response.body)
        })
    }
}

#[derive(Debug, Deserialize)]
struct KlineRow {
    /// Trade date, `"2026-08-06"`.
    d: String,
    /// Settlement close, serialized as a string by the endpoint.
    c: String,
}
