//! Domain types shared across the indicator subsystem.

mod code;
mod day;
mod holding;
mod timestamp;

pub use code::StockCode;
pub use day::MarketDay;
pub use holding::{
    HoldingConfig, IndicatorKind, RawCoreTrack, TrackSpec, DEFAULT_SALES_KEYWORD,
};
pub use timestamp::UtcDateTime;
