//! Calendar-month keys and their UTC date-time ranges.
//!
//! All range arithmetic uses UTC components exclusively so that a month's
//! boundaries never shift with the server's local time zone.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::{Date, Month, OffsetDateTime, UtcOffset, util::days_in_year_month};

use crate::Error;

/// A calendar month identified by year and month, parsed from a `"YYYY-MM"`
/// string.
///
/// Budgets are keyed on `(owner, month)` using the string form, and the
/// monthly summary resolves a `MonthKey` into an inclusive UTC range via
/// [MonthKey::date_range].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonthKey {
    year: i32,
    month: Month,
}

impl MonthKey {
    /// Create a month key from a year and month.
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// The month key a date-time falls in, using its UTC calendar components.
    pub fn from_date(date: OffsetDateTime) -> Self {
        let utc = date.to_offset(UtcOffset::UTC);

        Self {
            year: utc.year(),
            month: utc.month(),
        }
    }

    /// The year of this month key.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of this month key.
    pub fn month(&self) -> Month {
        self.month
    }

    /// The inclusive UTC range covering this calendar month.
    ///
    /// The range starts at the first instant of the month and ends at
    /// 23:59:59.999 on its last day. December resolves its last day within
    /// the same year.
    pub fn date_range(&self) -> DateRange {
        let last_day = days_in_year_month(self.year, self.month);

        let start = Date::from_calendar_date(self.year, self.month, 1)
            .expect("the first of a parsed month is always a valid date")
            .midnight()
            .assume_utc();
        let end = Date::from_calendar_date(self.year, self.month, last_day)
            .expect("the last day of a parsed month is always a valid date")
            .with_hms_milli(23, 59, 59, 999)
            .expect("23:59:59.999 is always a valid time")
            .assume_utc();

        DateRange { start, end }
    }
}

impl FromStr for MonthKey {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (year, month_number) = sscanf::sscanf!(text, "{u16}-{u8}")
            .ok_or_else(|| Error::InvalidMonth(text.to_string()))?;

        // Reject degenerate years such as "26-01" rather than guessing a
        // century.
        if !(1000..=9999).contains(&year) {
            return Err(Error::InvalidMonth(text.to_string()));
        }

        let month = Month::try_from(month_number).map_err(|_| Error::InvalidMonth(text.to_string()))?;

        Ok(Self {
            year: year as i32,
            month,
        })
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, u8::from(self.month))
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl ToSql for MonthKey {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for MonthKey {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(error.to_string().into()))
    }
}

/// An inclusive UTC date-time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first instant of the range.
    pub start: OffsetDateTime,
    /// The last instant of the range.
    pub end: OffsetDateTime,
}

impl DateRange {
    /// Whether `date` falls within the range, boundaries included.
    pub fn contains(&self, date: OffsetDateTime) -> bool {
        self.start <= date && date <= self.end
    }
}
