use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use tracing::debug;

use crate::data_source::{CommoditySource, PricePoint, SourceError, SourceId};

/// Secondary commodity price source: a locally maintained quotation file.
///
/// Commodities without a listed futures contract (specialty chemicals and
/// fermentation products) have no API quote anywhere; an external cron or a
/// human keeps dated industry-board samples in a JSON file shaped
/// `{ "味精": [ { "date": "2026-07-07", "price": 8600.0 }, ... ] }`.
/// Samples are normalized to an ascending series at load so the same
/// nearest-sample math applies as for the futures source.
#[derive(Debug, Default, Clone)]
pub struct QuoteBoardAdapter {
    board: HashMap<String, Vec<PricePoint>>,
}

impl QuoteBoardAdapter {
    /// Load the quotation file. A missing or unreadable file is an empty
    /// board, not an error: the secondary source being absent only matters
    /// once a holding actually needs it, and then it surfaces as a normal
    /// coverage miss.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) => {
                debug!(path = %path.display(), %error, "quote board unreadable; starting empty");
                return Self::default();
            }
        };

        match serde_json::from_str::<HashMap<String, Vec<PricePoint>>>(&raw) {
            Ok(board) => Self::from_entries(board),
            Err(error) => {
                debug!(path = %path.display(), %error, "quote board malformed; starting empty");
                Self::default()
            }
        }
    }

    pub fn from_entries(mut board: HashMap<String, Vec<PricePoint>>) -> Self {
        for series in board.values_mut() {
            series.sort_by_key(|point| point.date);
        }
        Self { board }
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_empty()
    }
}

impl CommoditySource for QuoteBoardAdapter {
    fn id(&self) -> SourceId {
        SourceId::QuoteBoard
    }

    fn covers(&self, commodity: &str) -> bool {
        self.board
            .get(commodity)
            .is_some_and(|series| !series.is_empty())
    }

    fn spot_series<'a>(
        &'a self,
        commodity: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PricePoint>, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            self.board
                .get(commodity)
                .filter(|series| !series.is_empty())
                .cloned()
                .ok_or_else(|| SourceError::no_coverage(SourceId::QuoteBoard, commodity))
        })
    }
}
