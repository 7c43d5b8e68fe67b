use std::future::Future;
use std::pin::Pin;

use serde_json::json;
use tracing::{debug, warn};

use crate::data_source::{Announcement, AnnouncementQuery, SourceError};
use crate::fetchers::{FetchContext, IndicatorFetcher};
use crate::{HoldingConfig, IndicatorKind, MarketDay, TrackSpec};

const ANNUAL_KEYWORD: &str = "年度报告";
const FLASH_KEYWORDS: [&str; 2] = ["业绩快报", "业绩预告"];
const SEARCH_LIMIT: usize = 5;

/// Abstracts, translations, and withdrawn filings all match the annual
/// keyword but are not the report itself.
const TITLE_NOISE: [&str; 3] = ["摘要", "英文", "取消"];

/// How recent a flash disclosure must be to count as news on a holding that
/// has never been checked before. Without this floor, the very first run
/// would flag months-old filings.
const FIRST_RUN_FLASH_WINDOW_DAYS: i64 = 30;

/// Annual-report disclosure watch, with a piggybacked check for newly
/// published earnings flash/preview filings.
#[derive(Debug, Default)]
pub struct AnnualReportWatchFetcher;

impl AnnualReportWatchFetcher {
    fn render_base(published: bool, expected_date: &str) -> String {
        if published {
            String::from("年报: 已发布！")
        } else {
            format!("年报: 未发布（预计{expected_date}）")
        }
    }

    fn is_annual_report(announcement: &Announcement) -> bool {
        announcement.title.contains(ANNUAL_KEYWORD)
            && !TITLE_NOISE
                .iter()
                .any(|noise| announcement.title.contains(noise))
    }

    fn watermark_key(holding: &HoldingConfig) -> String {
        format!(
            "{}:{}:watermark",
            holding.code,
            IndicatorKind::AnnualReportWatch
        )
    }

    /// Newest flash/preview publish date across both keywords, if any.
    async fn newest_flash(
        holding: &HoldingConfig,
        ctx: &FetchContext,
    ) -> Option<MarketDay> {
        let mut newest: Option<MarketDay> = None;

        for keyword in FLASH_KEYWORDS {
            let query = match AnnouncementQuery::new(
                holding.code.clone(),
                holding.name.clone(),
                keyword,
                SEARCH_LIMIT,
            ) {
                Ok(query) => query,
                Err(error) => {
                    debug!(code = %holding.code, keyword, %error, "skipping flash query");
                    continue;
                }
            };

            // The annual line must survive a broken flash search; the note
            // is an extra, not a dependency.
            let hits = match ctx.adapters.announcements.search(query).await {
                Ok(hits) => hits,
                Err(error) => {
                    debug!(code = %holding.code, keyword, %error, "flash search failed");
                    continue;
                }
            };

            let hit_date = hits
                .iter()
                .filter(|hit| hit.title.contains(keyword))
                .map(|hit| hit.publish_date)
                .max();

            newest = newest.max(hit_date);
        }

        newest
    }

    fn stored_watermark(holding: &HoldingConfig, ctx: &FetchContext) -> Option<MarketDay> {
        ctx.cache
            .get(&Self::watermark_key(holding))
            .and_then(|entry| entry.payload)
            .and_then(|payload| {
                payload
                    .get("last_seen")
                    .and_then(|value| value.as_str())
                    .and_then(|raw| MarketDay::parse(raw).ok())
            })
    }

    fn advance_watermark(holding: &HoldingConfig, ctx: &FetchContext, seen: MarketDay) {
        let entry = crate::cache::CacheEntry::new(seen.format_iso())
            .with_payload(json!({ "last_seen": seen.format_iso() }));
        if let Err(error) = ctx.cache.put(&Self::watermark_key(holding), entry) {
            warn!(code = %holding.code, %error, "failed to persist flash watermark");
        }
    }
}

impl IndicatorFetcher for AnnualReportWatchFetcher {
    fn kind(&self) -> IndicatorKind {
        IndicatorKind::AnnualReportWatch
    }

    fn fetch<'a>(
        &'a self,
        holding: &'a HoldingConfig,
        ctx: &'a FetchContext,
    ) -> Pin<Box<dyn Future<Output = Result<String, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            let TrackSpec::AnnualReportWatch { expected_date } = &holding.track else {
                return Err(SourceError::internal(
                    "holding is not configured for annual-report tracking",
                ));
            };

            let query = AnnouncementQuery::new(
                holding.code.clone(),
                holding.name.clone(),
                ANNUAL_KEYWORD,
                SEARCH_LIMIT,
            )?;
            let hits = ctx.adapters.announcements.search(query).await?;

            // Hits are most-recent-first; the first real annual report
            // decides the state.
            let published = hits
                .iter()
                .filter(|hit| Self::is_annual_report(hit))
                .map(|hit| hit.publish_date)
                .next()
                .is_some_and(|date| date.year() == ctx.today.year());

            let mut line = Self::render_base(published, expected_date);

            if let Some(flash_date) = Self::newest_flash(holding, ctx).await {
                let watermark = Self::stored_watermark(holding, ctx);
                let is_news = match watermark {
                    Some(seen) => flash_date > seen,
                    None => ctx.today.days_since(flash_date) <= FIRST_RUN_FLASH_WINDOW_DAYS,
                };

                if is_news {
                    line.push_str(&format!("｜新业绩披露({})", flash_date.format_iso()));
                    Self::advance_watermark(holding, ctx, flash_date);
                } else if watermark.is_none() {
                    // Record the stale filing so only genuinely newer ones
                    // flag later.
                    Self::advance_watermark(holding, ctx, flash_date);
                }
            }

            Ok(line)
        })
    }
}
