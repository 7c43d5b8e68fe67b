use std::sync::Arc;

use tracing::debug;

use crate::data_source::{CommoditySource, PricePoint, SourceError, SourceId};

/// A commodity series together with the source that supplied it.
#[derive(Debug, Clone, PartialEq)]
pub struct CommodityQuote {
    pub source: SourceId,
    pub series: Vec<PricePoint>,
}

/// Two-stage commodity source chain: the futures quote is authoritative when
/// a contract exists; the quotation board catches everything else. The
/// secondary is also consulted when the primary claims coverage but answers
/// empty or errors out.
pub struct CommodityRouter {
    primary: Arc<dyn CommoditySource>,
    secondary: Arc<dyn CommoditySource>,
}

impl CommodityRouter {
    pub fn new(primary: Arc<dyn CommoditySource>, secondary: Arc<dyn CommoditySource>) -> Self {
        Self { primary, secondary }
    }

    /// Resolve a price series for one commodity, falling back through the
    /// source chain.
    ///
    /// # Errors
    ///
    /// Returns the accumulated [`SourceError`] once both sources have been
    /// exhausted.
    pub async fn spot_series(&self, commodity: &str) -> Result<CommodityQuote, SourceError> {
        let mut failures: Vec<String> = Vec::with_capacity(2);

        for source in [&self.primary, &self.secondary] {
            if !source.covers(commodity) {
                failures.push(format!("{}: no coverage", source.id()));
                continue;
            }

            match source.spot_series(commodity).await {
                Ok(series) if !series.is_empty() => {
                    return Ok(CommodityQuote {
                        source: source.id(),
                        series,
                    });
                }
                Ok(_) => {
                    debug!(source = %source.id(), commodity, "source answered an empty series");
                    failures.push(format!("{}: empty series", source.id()));
                }
                Err(error) => {
                    debug!(source = %source.id(), commodity, %error, "source failed");
                    failures.push(format!("{}: {}", source.id(), error.message()));
                }
            }
        }

        Err(SourceError::unavailable(format!(
            "no source could price '{commodity}' [{}]",
            failures.join("; ")
        )))
    }
}
