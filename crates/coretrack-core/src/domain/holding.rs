use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ConfigError, StockCode, ValidationError};

/// Default announcement keyword for the monthly-sales watch.
pub const DEFAULT_SALES_KEYWORD: &str = "产销快报";

/// Closed enumeration of indicator kinds.
///
/// Adding a kind is a compile-time-visible change: the registry and the
/// raw-config parser both match exhaustively on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    SouthboundFlow,
    AnnualReportWatch,
    MonthlySales,
    MarginDividend,
    CommodityPrice,
    None,
}

impl IndicatorKind {
    pub const ALL: [Self; 6] = [
        Self::SouthboundFlow,
        Self::AnnualReportWatch,
        Self::MonthlySales,
        Self::MarginDividend,
        Self::CommodityPrice,
        Self::None,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SouthboundFlow => "southbound_flow",
            Self::AnnualReportWatch => "annual_report_watch",
            Self::MonthlySales => "monthly_sales",
            Self::MarginDividend => "margin_dividend",
            Self::CommodityPrice => "commodity_price",
            Self::None => "none",
        }
    }
}

impl Display for IndicatorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "southbound_flow" => Ok(Self::SouthboundFlow),
            "annual_report_watch" => Ok(Self::AnnualReportWatch),
            "monthly_sales" => Ok(Self::MonthlySales),
            "margin_dividend" => Ok(Self::MarginDividend),
            "commodity_price" => Ok(Self::CommodityPrice),
            "none" => Ok(Self::None),
            other => Err(ValidationError::InvalidKind {
                value: other.to_owned(),
            }),
        }
    }
}

/// Validated per-holding tracking spec: the indicator kind plus its
/// type-specific parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSpec {
    SouthboundFlow,
    AnnualReportWatch {
        /// Display-form expected disclosure date, rendered verbatim
        /// (e.g. "3/20").
        expected_date: String,
    },
    MonthlySales {
        keyword: String,
    },
    MarginDividend,
    CommodityPrice {
        /// Display order follows configured order.
        commodities: Vec<String>,
    },
    None,
}

impl TrackSpec {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            Self::SouthboundFlow => IndicatorKind::SouthboundFlow,
            Self::AnnualReportWatch { .. } => IndicatorKind::AnnualReportWatch,
            Self::MonthlySales { .. } => IndicatorKind::MonthlySales,
            Self::MarginDividend => IndicatorKind::MarginDividend,
            Self::CommodityPrice { .. } => IndicatorKind::CommodityPrice,
            Self::None => IndicatorKind::None,
        }
    }

    /// Validate a raw `{type, params}` record into a spec.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unknown tag or a missing/empty required
    /// param. Callers degrade to [`TrackSpec::None`] instead of aborting.
    pub fn from_raw(raw: &RawCoreTrack) -> Result<Self, ConfigError> {
        let kind = raw
            .kind
            .parse::<IndicatorKind>()
            .map_err(|_| ConfigError::UnknownKind {
                value: raw.kind.clone(),
            })?;

        match kind {
            IndicatorKind::SouthboundFlow => Ok(Self::SouthboundFlow),
            IndicatorKind::AnnualReportWatch => {
                let expected_date =
                    required_str(&raw.params, "annual_report_watch", "expected_date")?;
                Ok(Self::AnnualReportWatch { expected_date })
            }
            IndicatorKind::MonthlySales => {
                let keyword = match raw.params.get("keyword") {
                    Some(value) => non_empty_str(value, "monthly_sales", "keyword")?,
                    None => DEFAULT_SALES_KEYWORD.to_owned(),
                };
                Ok(Self::MonthlySales { keyword })
            }
            IndicatorKind::MarginDividend => Ok(Self::MarginDividend),
            IndicatorKind::CommodityPrice => {
                let commodities = required_str_list(&raw.params, "commodity_price", "commodities")?;
                Ok(Self::CommodityPrice { commodities })
            }
            IndicatorKind::None => Ok(Self::None),
        }
    }
}

fn required_str(
    params: &Map<String, Value>,
    kind: &'static str,
    param: &'static str,
) -> Result<String, ConfigError> {
    let value = params
        .get(param)
        .ok_or(ConfigError::MissingParam { kind, param })?;
    non_empty_str(value, kind, param)
}

fn non_empty_str(
    value: &Value,
    kind: &'static str,
    param: &'static str,
) -> Result<String, ConfigError> {
    let text = value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::EmptyParam { kind, param })?;
    Ok(text.to_owned())
}

fn required_str_list(
    params: &Map<String, Value>,
    kind: &'static str,
    param: &'static str,
) -> Result<Vec<String>, ConfigError> {
    let values = params
        .get(param)
        .and_then(Value::as_array)
        .ok_or(ConfigError::MissingParam { kind, param })?;

    let list = values
        .iter()
        .map(|value| non_empty_str(value, kind, param))
        .collect::<Result<Vec<_>, _>>()?;

    if list.is_empty() {
        return Err(ConfigError::EmptyParam { kind, param });
    }

    Ok(list)
}

/// Raw `core_track` record as stored in the portfolio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCoreTrack {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// One configured position: identity plus its indicator spec.
///
/// `note` is the holding's static description text; the report falls back to
/// it whenever no indicator line is available.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldingConfig {
    pub code: StockCode,
    pub name: String,
    pub note: String,
    pub track: TrackSpec,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(kind: &str, params: Value) -> RawCoreTrack {
        RawCoreTrack {
            kind: kind.to_owned(),
            params: params.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in IndicatorKind::ALL {
            assert_eq!(kind.as_str().parse::<IndicatorKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_kind_is_a_config_error() {
        let err = TrackSpec::from_raw(&raw("quarterly_report", serde_json::json!({})))
            .expect_err("must fail");
        assert!(matches!(err, ConfigError::UnknownKind { .. }));
    }

    #[test]
    fn annual_report_watch_requires_expected_date() {
        let err =
            TrackSpec::from_raw(&raw("annual_report_watch", serde_json::json!({}))).expect_err(
                "missing expected_date must fail",
            );
        assert!(matches!(err, ConfigError::MissingParam { .. }));

        let spec = TrackSpec::from_raw(&raw(
            "annual_report_watch",
            serde_json::json!({"expected_date": "3/20"}),
        ))
        .expect("must parse");
        assert_eq!(
            spec,
            TrackSpec::AnnualReportWatch {
                expected_date: String::from("3/20")
            }
        );
    }

    #[test]
    fn monthly_sales_defaults_its_keyword() {
        let spec =
            TrackSpec::from_raw(&raw("monthly_sales", serde_json::json!({}))).expect("must parse");
        assert_eq!(
            spec,
            TrackSpec::MonthlySales {
                keyword: DEFAULT_SALES_KEYWORD.to_owned()
            }
        );
    }

    #[test]
    fn commodity_price_preserves_configured_order() {
        let spec = TrackSpec::from_raw(&raw(
            "commodity_price",
            serde_json::json!({"commodities": ["味精", "玉米"]}),
        ))
        .expect("must parse");
        assert_eq!(
            spec,
            TrackSpec::CommodityPrice {
                commodities: vec![String::from("味精"), String::from("玉米")]
            }
        );
    }

    #[test]
    fn commodity_price_rejects_empty_list() {
        let err = TrackSpec::from_raw(&raw(
            "commodity_price",
            serde_json::json!({"commodities": []}),
        ))
        .expect_err("empty list must fail");
        assert!(matches!(err, ConfigError::EmptyParam { .. }));
    }
}
