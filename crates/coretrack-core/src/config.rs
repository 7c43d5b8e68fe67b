//! Portfolio configuration loading.
//!
//! Holdings arrive from a static JSON file, loaded once per run and
//! immutable afterwards. A broken `core_track` block never aborts the load:
//! the holding degrades to the `none` indicator (static text only) and the
//! reason is logged.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::{ConfigError, HoldingConfig, RawCoreTrack, StockCode, TrackSpec};

#[derive(Debug, Deserialize)]
struct RawPortfolio {
    holdings: Vec<RawHolding>,
}

#[derive(Debug, Deserialize)]
struct RawHolding {
    code: StockCode,
    name: String,
    #[serde(default)]
    note: String,
    #[serde(default)]
    core_track: Option<RawCoreTrack>,
}

/// The configured holdings, in file order.
#[derive(Debug, Default)]
pub struct PortfolioConfig {
    pub holdings: Vec<HoldingConfig>,
}

impl PortfolioConfig {
    /// Load and validate the portfolio file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] only for an unreadable or structurally
    /// invalid file; per-holding indicator problems degrade instead.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|error| ConfigError::Unreadable(error.to_string()))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let portfolio: RawPortfolio =
            serde_json::from_str(raw).map_err(|error| ConfigError::Invalid(error.to_string()))?;

        let holdings = portfolio
            .holdings
            .into_iter()
            .map(|raw| {
                let track = resolve_track(&raw.code, raw.core_track.as_ref());
                HoldingConfig {
                    code: raw.code,
                    name: raw.name,
                    note: raw.note,
                    track,
                }
            })
            .collect();

        Ok(Self { holdings })
    }
}

fn resolve_track(code: &StockCode, raw: Option<&RawCoreTrack>) -> TrackSpec {
    let Some(raw) = raw else {
        return TrackSpec::None;
    };

    match TrackSpec::from_raw(raw) {
        Ok(track) => track,
        Err(error) => {
            warn!(%code, %error, "degrading holding to 'none' tracking");
            TrackSpec::None
        }
    }
}
