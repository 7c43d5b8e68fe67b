use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

use crate::circuit_breaker::CircuitBreaker;
use crate::data_source::{
    Announcement, AnnouncementQuery, AnnouncementSource, SourceError, SourceId,
};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::MarketDay;

const SEARCH_URL: &str = "http://www.cninfo.com.cn/new/fulltextSearch/full";

/// Search window; disclosure watches never need to look back further.
const SEARCH_WINDOW_DAYS: i64 = 365;

/// cninfo full-text announcement search client.
///
/// Two fetchers hit this source once per configured holding, so a shared
/// circuit breaker stops the batch from burning a transport timeout per
/// holding once the site goes dark.
#[derive(Clone)]
pub struct CninfoAnnouncementAdapter {
    http_client: Arc<dyn HttpClient>,
    circuit_breaker: Arc<CircuitBreaker>,
}

impl Default for CninfoAnnouncementAdapter {
    fn default() -> Self {
        Self {
            http_client: Arc::new(NoopHttpClient),
            circuit_breaker: Arc::new(CircuitBreaker::default()),
        }
    }
}

impl CninfoAnnouncementAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            ..Self::default()
        }
    }

    pub fn with_circuit_breaker(mut self, circuit_breaker: Arc<CircuitBreaker>) -> Self {
        self.circuit_breaker = circuit_breaker;
        self
    }

    fn search_endpoint(query: &AnnouncementQuery, today: MarketDay) -> String {
        format!(
            "{SEARCH_URL}?searchkey={}&sdate={}&edate={}\
             &isfulltext=false&sortName=pubdate&sortType=desc\
             &pageNum=1&pageSize={}",
            urlencoding::encode(&query.search_term()),
            today.minus_days(SEARCH_WINDOW_DAYS).format_iso(),
            today.format_iso(),
            query.limit
        )
    }

    fn parse_search(body: &str, limit: usize) -> Result<Vec<Announcement>, SourceError> {
        let response: SearchResponse = serde_json::from_str(body).map_err(|e| {
            SourceError::malformed(format!("failed to parse announcement search response: {e}"))
        })?;

        let hits = response.announcements.unwrap_or_default();

        let mut parsed = Vec::with_capacity(hits.len().min(limit));
        for hit in hits.into_iter().take(limit) {
            let Some(publish_date) = hit
                .announcement_time
                .and_then(|millis| MarketDay::from_unix_millis(millis).ok())
            else {
                // A dateless hit is useless to every consumer; skip it.
                continue;
            };

            parsed.push(Announcement {
                title: strip_markup(&hit.announcement_title),
                summary: hit
                    .announcement_content
                    .as_deref()
                    .map(strip_markup)
                    .filter(|s| !s.is_empty()),
                publish_date,
            });
        }

        Ok(parsed)
    }
}

impl AnnouncementSource for CninfoAnnouncementAdapter {
    fn id(&self) -> SourceId {
        SourceId::Cninfo
    }

    fn search<'a>(
        &'a self,
        query: AnnouncementQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Announcement>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            if !self.circuit_breaker.allow_request() {
                return Err(SourceError::unavailable(
                    "cninfo circuit breaker is open; skipping upstream call",
                ));
            }

            let endpoint = Self::search_endpoint(&query, MarketDay::today());
            let request = HttpRequest::get(endpoint);

            let response = self.http_client.execute(request).await.map_err(|e| {
                self.circuit_breaker.record_failure();
                SourceError::unavailable(format!("cninfo transport error: {}", e.message()))
            })?;

            if !response.is_success() {
                self.circuit_breaker.record_failure();
                return Err(SourceError::unavailable(format!(
                    "cninfo returned status {}",
                    response.status
                )));
            }

            let parsed = Self::parse_search(&response.body, query.limit);
            match &parsed {
                Ok(_) => self.circuit_breaker.record_success(),
                // A malformed body counts against the breaker too; an
                // endpoint serving error pages is as dead as a refused
                // connection.
                Err(_) => self.circuit_breaker.record_failure(),
            }
            parsed
        })
    }
}

/// Search hits carry `<em>` highlight markup inside titles and excerpts.
fn strip_markup(input: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));
    tag.replace_all(input, "").trim().to_owned()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    announcements: Option<Vec<SearchHit>>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "announcementTitle", default)]
    announcement_title: String,
    #[serde(rename = "announcementContent", default)]
    announcement_content: Option<String>,
    #[serde(rename = "announcementTime", default)]
    announcement_time: Option<i64>,
}
