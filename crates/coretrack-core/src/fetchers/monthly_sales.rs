use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;

use regex::Regex;

use crate::data_source::{Announcement, AnnouncementQuery, SourceError};
use crate::fetchers::{FetchContext, IndicatorFetcher};
use crate::{HoldingConfig, IndicatorKind, TrackSpec};

const SEARCH_LIMIT: usize = 5;

/// Monthly production/sales bulletin watch for turnaround holdings.
///
/// Bulletins are free text; the key figures are extracted from the
/// announcement title plus the search excerpt.
#[derive(Debug, Default)]
pub struct MonthlySalesFetcher;

/// Figures pulled out of one bulletin.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SalesFigures {
    month: u8,
    volume: u64,
    yoy_pct: f64,
}

fn period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})年(\d{1,2})月").expect("period pattern is valid"))
}

fn volume_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"销量[^0-9]{0,4}([0-9][0-9,]*)辆").expect("volume pattern is valid")
    })
}

fn yoy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"同比(增长|上升|增加|下降|下滑|减少)?([+-]?\d+(?:\.\d+)?)%")
            .expect("yoy pattern is valid")
    })
}

impl MonthlySalesFetcher {
    fn render(figures: SalesFigures) -> String {
        format!(
            "最新产销: {}月 销量{}辆 同比{:+.1}%",
            figures.month,
            format_thousands(figures.volume),
            figures.yoy_pct
        )
    }

    /// Extract month, volume, and year-over-year percent from one bulletin.
    /// The month must come from the title (excerpts routinely quote other
    /// periods); volume and yoy may sit in either.
    fn parse_bulletin(announcement: &Announcement) -> Option<SalesFigures> {
        let month: u8 = period_re()
            .captures(&announcement.title)?
            .get(2)?
            .as_str()
            .parse()
            .ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }

        let mut text = announcement.title.clone();
        if let Some(summary) = &announcement.summary {
            text.push(' ');
            text.push_str(summary);
        }

        let volume: u64 = volume_re()
            .captures(&text)?
            .get(1)?
            .as_str()
            .replace(',', "")
            .parse()
            .ok()?;

        let yoy = yoy_re().captures(&text)?;
        let magnitude: f64 = yoy.get(2)?.as_str().parse().ok()?;
        let decreasing = matches!(
            yoy.get(1).map(|m| m.as_str()),
            Some("下降" | "下滑" | "减少")
        );
        let yoy_pct = if decreasing && magnitude > 0.0 {
            -magnitude
        } else {
            magnitude
        };

        Some(SalesFigures {
            month,
            volume,
            yoy_pct,
        })
    }
}

impl IndicatorFetcher for MonthlySalesFetcher {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::MonthlySales
    }

    fn fetch<'a>(
        &'a self,
        holding: &'a HoldingConfig,
        ctx: &'a FetchContext,
    ) -> Pin<Box<dyn Future<Output = Result<String, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let TrackSpec::MonthlySales { keyword } = &holding.track else {
                return Err(SourceError::internal(
                    "holding is not configured for monthly-sales tracking",
                ));
            };

            let query = AnnouncementQuery::new(
                holding.code.clone(),
                holding.name.clone(),
                keyword.clone(),
                SEARCH_LIMIT,
            )?;
            let hits = ctx.adapters.announcements.search(query).await?;

            // Most recent parseable bulletin wins.
            hits.iter()
                .find_map(Self::parse_bulletin)
                .map(Self::render)
                .ok_or_else(|| {
                    SourceError::malformed(format!(
                        "no parseable '{keyword}' bulletin among {} hits",
                        hits.len()
                    ))
                })
        })
    }
}

fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
