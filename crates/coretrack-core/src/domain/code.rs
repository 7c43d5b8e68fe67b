use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::ValidationError;

const CODE_LEN: usize = 6;

/// Normalized six-digit exchange code for a mainland-listed security or fund.
///
/// Both stocks ("600036") and exchange-traded funds ("513180") use the same
/// six-digit form on cninfo and the quote APIs, so one newtype covers every
/// configured holding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StockCode(String);

impl StockCode {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyCode);
        }

        if trimmed.len() != CODE_LEN || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidCode {
                value: trimmed.to_owned(),
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StockCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for StockCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for StockCode {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<StockCode> for String {
    fn from(value: StockCode) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_trims_code() {
        let parsed = StockCode::parse(" 600036 ").expect("code should parse");
        assert_eq!(parsed.as_str(), "600036");
    }

    #[test]
    fn rejects_short_code() {
        let err = StockCode::parse("60003").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidCode { .. }));
    }

    #[test]
    fn rejects_non_digit_code() {
        let err = StockCode::parse("60003A").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidCode { .. }));
    }

    #[test]
    fn rejects_empty_code() {
        let err = StockCode::parse("   ").expect_err("must fail");
        assert!(matches!(err, ValidationError::EmptyCode));
    }
}
