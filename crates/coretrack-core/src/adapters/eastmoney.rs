use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;

use crate::data_source::{FlowSnapshot, FlowSource, SourceError, SourceId};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::MarketDay;

const DATACENTER_URL: &str = "https://datacenter-web.eastmoney.com/api/data/v1/get";

/// Southbound mutual-market aggregate in the Eastmoney datacenter.
const SOUTHBOUND_MUTUAL_TYPE: &str = "006";

/// Sessions summed for the trailing cumulative figure.
const CUMULATIVE_SESSIONS: usize = 5;

/// Eastmoney datacenter client for the southbound connect flow history.
///
/// Figures arrive in 亿元 already; no unit conversion happens here.
#[derive(Clone)]
pub struct EastmoneyFlowAdapter {
    http_client: Arc<dyn HttpClient>,
}

impl Default for EastmoneyFlowAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
        }
    }
}

impl EastmoneyFlowAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self { http_client }
    }

    fn history_endpoint() -> String {
        format!(
            "{DATACENTER_URL}?reportName=RPT_MUTUAL_DEAL_HISTORY\
             &columns=TRADE_DATE%2CNET_DEAL_AMT\
             &sortColumns=TRADE_DATE&sortTypes=-1\
             &pageNumber=1&pageSize=10\
             &filter={}",
            urlencoding::encode(&format!("(MUTUAL_TYPE=\"{SOUTHBOUND_MUTUAL_TYPE}\")"))
        )
    }

    fn parse_history(body: &str) -> Result<FlowSnapshot, SourceError> {
        let response: DatacenterResponse = serde_json::from_str(body).map_err(|e| {
            SourceError::malformed(format!("failed to parse southbound flow response: {e}"))
        })?;

        let rows = response
            .result
            .map(|result| result.data)
            .unwrap_or_default();

        // Rows come newest first. A closed market simply means the newest
        // row is the last session, which is exactly what the report wants.
        let latest = rows
            .first()
            .ok_or_else(|| SourceError::malformed("southbound flow history is empty"))?;

        let trade_date = parse_trade_date(&latest.trade_date)?;
        let latest_net = latest
            .net_deal_amt
            .ok_or_else(|| SourceError::malformed("latest session has no net deal amount"))?;

        let five_day_net = rows
            .iter()
            .take(CUMULATIVE_SESSIONS)
            .filter_map(|row| row.net_deal_amt)
            .sum();

        Ok(FlowSnapshot {
            trade_date,
            latest_net,
            five_day_net,
        })
    }
}

impl FlowSource for EastmoneyFlowAdapter {
    fn id(&self) -> SourceId {
        SourceId::Eastmoney
    }

    fn southbound_flow<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<FlowSnapshot, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let request = HttpRequest::get(Self::history_endpoint());
            let response = self.http_client.execute(request).await.map_err(|e| {
                SourceError::unavailable(format!("eastmoney transport error: {}", e.message()))
            })?;

            if !response.is_success() {
                return Err(SourceError::unavailable(format!(
                    "eastmoney returned status {}",
                    response.status
                )));
            }

            Self::parse_history(&response.body)
        })
    }
}

/// `TRADE_DATE` arrives as `"2026-08-06 00:00:00"`; only the date part matters.
fn parse_trade_date(raw: &str) -> Result<MarketDay, SourceError> {
    let date_part = raw.split_whitespace().next().unwrap_or(raw);
    MarketDay::parse(date_part)
        .map_err(|_| SourceError::malformed(format!("unparsable trade date '{raw}'")))
}

#[derive(Debug, Deserialize)]
struct DatacenterResponse {
    #[serde(default)]
    result: Option<DatacenterResult>,
}

#[derive(Debug, Deserialize)]
struct DatacenterResult {
    #[serde(default)]
    data: Vec<FlowRow>,
}

#[derive(Debug, Deserialize)]
struct FlowRow {
    #[serde(rename = "TRADE_DATE")]
    trade_date: String,
    #[serde(rename = "NET_DEAL_AMT")]
    net_deal_amt: Option<f64>,
}
