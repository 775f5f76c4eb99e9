//! Year-less syslog wall-clock timestamps (`Oct 26 00:09:12`).
//!
//! Month names are looked up in a fixed English table so parsing never
//! depends on the system locale.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::logline::LineError;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Returns the month number (1-12) for an English month abbreviation.
pub fn month_from_abbrev(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .and_then(|idx| u32::try_from(idx + 1).ok())
}

/// A wall-clock reading without a year, truncated to the minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallClock {
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

impl WallClock {
    /// Parses `Mon DD HH:MM:SS`; any run of whitespace separates the fields.
    ///
    /// Seconds are validated and then dropped.
    pub fn parse(value: &str) -> Result<Self, LineError> {
        let invalid = || LineError::InvalidTimestamp(value.to_string());

        let mut parts = value.split_whitespace();
        let month_name = parts.next().ok_or_else(invalid)?;
        let day = parts.next().ok_or_else(invalid)?;
        let time = parts.next().ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        let month = month_from_abbrev(month_name)
            .ok_or_else(|| LineError::UnknownMonth(month_name.to_string()))?;
        let day: u32 = day.parse().map_err(|_| invalid())?;

        let mut fields = time.split(':');
        let mut next_field = |max: u32| -> Result<u32, LineError> {
            let field: u32 = fields
                .next()
                .ok_or_else(invalid)?
                .parse()
                .map_err(|_| invalid())?;
            if field > max {
                return Err(invalid());
            }
            Ok(field)
        };
        let hour = next_field(23)?;
        let minute = next_field(59)?;
        // leap second tolerated
        next_field(60)?;

        if !(1..=31).contains(&day) {
            return Err(invalid());
        }
        // Feb 29 is checked against a leap year so it survives until a year is known.
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(invalid());
        }

        Ok(Self {
            month,
            day,
            hour,
            minute,
        })
    }

    /// Attaches a year, clamping Feb 29 to Feb 28 in non-leap years.
    pub fn with_year(self, year: i32) -> NaiveDateTime {
        let date = NaiveDate::from_ymd_opt(year, self.month, self.day)
            .or_else(|| NaiveDate::from_ymd_opt(year, self.month, self.day - 1))
            .unwrap_or(NaiveDate::MIN);
        date.and_hms_opt(self.hour, self.minute, 0)
            .unwrap_or(NaiveDateTime::MIN)
    }
}

/// Moves a datetime one year back, clamping Feb 29 to Feb 28.
pub fn previous_year(value: NaiveDateTime) -> NaiveDateTime {
    let year = value.year() - 1;
    value.with_year(year).unwrap_or_else(|| {
        NaiveDate::from_ymd_opt(year, 2, 28)
            .map_or(value, |date| date.and_time(value.time()))
    })
}
