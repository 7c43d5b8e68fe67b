//! Adapter contracts and request/response types.
//!
//! This module defines the narrow typed boundaries between the indicator
//! fetchers and the external data providers, along with the adapter-level
//! error classification used for fallback decisions.
//!
//! # Contracts
//!
//! | Contract | Returns | Consumed by |
//! |----------|---------|-------------|
//! | [`FlowSource`] | [`FlowSnapshot`] | southbound-flow fetcher |
//! | [`AnnouncementSource`] | [`Announcement`] list | annual-report and monthly-sales fetchers |
//! | [`CommoditySource`] | [`PricePoint`] series | commodity-price fetcher (via the router) |
//! | [`SnapshotProvider`] | [`FinancialSnapshot`] | margin/dividend fetcher (no I/O) |
//!
//! Providers are swappable behind these traits without touching fetcher
//! logic.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{MarketDay, StockCode, UtcDateTime};

/// Canonical identifiers for the upstream providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    Eastmoney,
    Cninfo,
    SinaFutures,
    QuoteBoard,
}

impl SourceId {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eastmoney => "eastmoney",
            Self::Cninfo => "cninfo",
            Self::SinaFutures => "sina_futures",
            Self::QuoteBoard => "quote_board",
        }
    }
}

impl Display for SourceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Network failure, timeout, or non-2xx upstream status.
    Unavailable,
    /// Response arrived but had an unexpected shape or unparsable content.
    Malformed,
    /// The source does not carry the requested instrument at all.
    NoCoverage,
    Internal,
}

/// Structured source error caught at the fetcher or dispatcher boundary and
/// converted into the fallback sentinel. Never propagates past the
/// dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Malformed,
            message: message.into(),
        }
    }

    pub fn no_coverage(source: SourceId, commodity: &str) -> Self {
        Self {
            kind: SourceErrorKind::NoCoverage,
            message: format!("source '{source}' has no coverage for '{commodity}'"),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::NoCoverage => "source.no_coverage",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Southbound connect net capital flow, units 亿元.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowSnapshot {
    /// Most recent session with published figures. May lag the calendar day
    /// when markets are closed.
    pub trade_date: MarketDay,
    pub latest_net: f64,
    pub five_day_net: f64,
}

/// One full-text announcement search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub title: String,
    /// Search-hit excerpt, markup already stripped. Bulletin figures are
    /// parsed out of `title` + `summary`.
    pub summary: Option<String>,
    pub publish_date: MarketDay,
}

/// Validated announcement search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnouncementQuery {
    pub code: StockCode,
    pub company: String,
    pub keyword: String,
    pub limit: usize,
}

impl AnnouncementQuery {
    pub fn new(
        code: StockCode,
        company: impl Into<String>,
        keyword: impl Into<String>,
        limit: usize,
    ) -> Result<Self, SourceError> {
        let keyword = keyword.into();
        if keyword.trim().is_empty() {
            return Err(SourceError::internal(
                "announcement search keyword must not be empty",
            ));
        }
        if limit == 0 {
            return Err(SourceError::internal(
                "announcement search limit must be greater than zero",
            ));
        }
        Ok(Self {
            code,
            company: company.into(),
            keyword,
            limit,
        })
    }

    /// Combined full-text search term, `"{company} {keyword}"` when a company
    /// name is configured.
    pub fn search_term(&self) -> String {
        let company = self.company.trim();
        if company.is_empty() {
            self.keyword.clone()
        } else {
            format!("{company} {}", self.keyword)
        }
    }
}

/// One daily price sample of a commodity series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: MarketDay,
    /// Settlement close for futures; the quotation-board file calls the same
    /// field "price".
    #[serde(alias = "price")]
    pub close: f64,
}

/// Per-holding financial figures already fetched by the external
/// quote/fundamentals engine. Passed in, never re-fetched here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub code: StockCode,
    pub net_interest_margin: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub as_of: UtcDateTime,
}

/// Southbound capital-flow source.
pub trait FlowSource: Send + Sync {
    fn id(&self) -> SourceId;

    /// Latest-session net inflow and trailing five-session cumulative.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on timeout, connection failure, non-2xx
    /// status, or an unparsable/empty payload.
    fn southbound_flow<'a>(
        &'a self,
    ) -> Pin<Box<dyn Future<Output = Result<FlowSnapshot, SourceError>> + Send + 'a>>;
}

/// Full-text announcement search source.
pub trait AnnouncementSource: Send + Sync {
    fn id(&self) -> SourceId;

    /// Hits ordered most recent first, at most `query.limit` of them.
    fn search<'a>(
        &'a self,
        query: AnnouncementQuery,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Announcement>, SourceError>> + Send + 'a>>;
}

/// Commodity spot/contract price source.
pub trait CommoditySource: Send + Sync {
    fn id(&self) -> SourceId;

    /// Whether this source carries the commodity at all. Routing consults
    /// this before issuing a call.
    fn covers(&self, commodity: &str) -> bool;

    /// Recent daily series, ascending by date.
    fn spot_series<'a>(
        &'a self,
        commodity: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PricePoint>, SourceError>> + Send + 'a>>;
}

/// Boundary to the excluded quote/fundamentals subsystem. Implementations
/// must not perform I/O.
pub trait SnapshotProvider: Send + Sync {
    fn snapshot(&self, code: &StockCode) -> Option<FinancialSnapshot>;
}
