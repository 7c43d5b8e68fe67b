use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::{format_description, offset};
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::ValidationError;

/// Exchange time zone for the mainland session. The batch may run from any
/// host time zone; cache keys and "today" checks always roll with this
/// offset, not the host clock.
const EXCHANGE_OFFSET: UtcOffset = offset!(+8);

const ISO_DATE: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Calendar date in the exchange time zone, the `{date}` component of every
/// cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarketDay(Date);

impl MarketDay {
    /// Current calendar date at the exchange.
    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().to_offset(EXCHANGE_OFFSET).date())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), ISO_DATE)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDay {
                value: input.to_owned(),
            })
    }

    pub fn from_date(date: Date) -> Self {
        Self(date)
    }

    /// Calendar date of a Unix millisecond timestamp, interpreted at the
    /// exchange offset. cninfo reports publish times this way.
    pub fn from_unix_millis(millis: i64) -> Result<Self, ValidationError> {
        let ts = OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
            .map_err(|_| ValidationError::InvalidDay {
                value: millis.to_string(),
            })?;
        Ok(Self(ts.to_offset(EXCHANGE_OFFSET).date()))
    }

    pub fn minus_days(self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    /// Whole calendar days from `other` to `self` (positive when `self` is later).
    pub fn days_since(self, other: Self) -> i64 {
        (self.0 - other.0).whole_days()
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u8 {
        u8::from(self.0.month())
    }

    pub fn into_inner(self) -> Date {
        self.0
    }

    pub fn format_iso(self) -> String {
        self.0
            .format(ISO_DATE)
            .expect("MarketDay must be ISO formattable")
    }
}

impl Display for MarketDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format_iso())
    }
}

impl Serialize for MarketDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.format_iso())
    }
}

impl<'de> Deserialize<'de> for MarketDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}
