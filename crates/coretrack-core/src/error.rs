use thiserror::Error;

/// Validation and contract errors exposed by `coretrack-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("stock code cannot be empty")]
    EmptyCode,
    #[error("stock code must be exactly six ASCII digits: '{value}'")]
    InvalidCode { value: String },

    #[error(
        "invalid indicator kind '{value}', expected one of southbound_flow, \
         annual_report_watch, monthly_sales, margin_dividend, commodity_price, none"
    )]
    InvalidKind { value: String },

    #[error("market day must be an ISO calendar date (YYYY-MM-DD): '{value}'")]
    InvalidDay { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
}

/// Holding-configuration errors.
///
/// These never abort a run: the config layer degrades the offending holding
/// to the `none` indicator and logs the reason.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown indicator type '{value}'")]
    UnknownKind { value: String },

    #[error("indicator '{kind}' is missing required param '{param}'")]
    MissingParam {
        kind: &'static str,
        param: &'static str,
    },

    #[error("indicator '{kind}' param '{param}' must not be empty")]
    EmptyParam {
        kind: &'static str,
        param: &'static str,
    },

    #[error("portfolio file unreadable: {0}")]
    Unreadable(String),

    #[error("portfolio file is not valid JSON: {0}")]
    Invalid(String),
}
