use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// A day on the calendar, written `DD-MM-YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalendarDate(NaiveDate);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    /// Not three `-` separated numeric fields.
    Malformed(String),
    /// Well-formed fields naming a day that does not exist (e.g. 30-02-2024).
    NoSuchDay(String),
}

impl fmt::Display for DateParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateParseError::Malformed(s) => write!(f, "malformed date {s:?}, expected DD-MM-YYYY"),
            DateParseError::NoSuchDay(s) => write!(f, "no such calendar day: {s}"),
        }
    }
}

impl std::error::Error for DateParseError {}

impl CalendarDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Today in the host's local calendar.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// Move by `delta_days`, negative for the past. Saturates at chrono's
    /// representable range, which no real reservation reaches.
    pub fn shift(self, delta_days: i64) -> Self {
        let magnitude = Days::new(delta_days.unsigned_abs());
        let shifted = if delta_days >= 0 {
            self.0.checked_add_days(magnitude)
        } else {
            self.0.checked_sub_days(magnitude)
        };
        Self(shifted.unwrap_or(if delta_days >= 0 { NaiveDate::MAX } else { NaiveDate::MIN }))
    }

    /// `later - self` in whole days; positive when `later` is after `self`.
    pub fn days_until(self, later: CalendarDate) -> i64 {
        (later.0 - self.0).num_days()
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn day(self) -> u32 {
        self.0.day()
    }
}

/// Signed difference `date2 - date1` in days.
pub fn days_between(date1: CalendarDate, date2: CalendarDate) -> i64 {
    date1.days_until(date2)
}

pub fn shift_date(date: CalendarDate, delta_days: i64) -> CalendarDate {
    date.shift(delta_days)
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}-{:04}", self.0.day(), self.0.month(), self.0.year())
    }
}

impl FromStr for CalendarDate {
    type Err = DateParseError;

    /// Accepts `DD-MM-YYYY` as well as unpadded day and month (`1-2-2024`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let malformed = || DateParseError::Malformed(trimmed.to_string());

        let mut parts = trimmed.split('-');
        let (Some(d), Some(m), Some(y), None) = (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };
        if [d, m, y].iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
            return Err(malformed());
        }
        if d.len() > 2 || m.len() > 2 || y.len() != 4 {
            return Err(malformed());
        }

        let day: u32 = d.parse().map_err(|_| malformed())?;
        let month: u32 = m.parse().map_err(|_| malformed())?;
        let year: i32 = y.parse().map_err(|_| malformed())?;
        Self::from_ymd(year, month, day).ok_or_else(|| DateParseError::NoSuchDay(trimmed.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> CalendarDate {
        s.parse().unwrap()
    }

    #[test]
    fn days_between_is_signed() {
        assert_eq!(days_between(date("01-01-2024"), date("10-01-2024")), 9);
        assert_eq!(days_between(date("10-01-2024"), date("01-01-2024")), -9);
        assert_eq!(days_between(date("10-01-2024"), date("10-01-2024")), 0);
    }

    #[test]
    fn shift_handles_leap_years() {
        assert_eq!(shift_date(date("28-02-2024"), 1), date("29-02-2024"));
        assert_eq!(shift_date(date("28-02-2023"), 1), date("01-03-2023"));
        assert_eq!(shift_date(date("01-03-2024"), -1), date("29-02-2024"));
    }

    #[test]
    fn shift_rolls_over_year() {
        assert_eq!(shift_date(date("31-12-2024"), 1), date("01-01-2025"));
        assert_eq!(shift_date(date("01-01-2025"), -1), date("31-12-2024"));
        assert_eq!(shift_date(date("15-06-2024"), 0), date("15-06-2024"));
    }

    #[test]
    fn display_is_zero_padded() {
        let d = CalendarDate::from_ymd(2024, 2, 3).unwrap();
        assert_eq!(d.to_string(), "03-02-2024");
        assert_eq!((d.day(), d.month(), d.year()), (3, 2, 2024));
    }

    #[test]
    fn parse_accepts_unpadded_fields() {
        assert_eq!(date("3-2-2024"), CalendarDate::from_ymd(2024, 2, 3).unwrap());
        assert_eq!(date(" 03-02-2024 "), CalendarDate::from_ymd(2024, 2, 3).unwrap());
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", "always", "2024-02-03", "03/02/2024", "03-02-24", "03-02-2024-01", "a3-02-2024"] {
            assert!(
                matches!(bad.parse::<CalendarDate>(), Err(DateParseError::Malformed(_))),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn parse_rejects_impossible_days() {
        assert!(matches!("30-02-2024".parse::<CalendarDate>(), Err(DateParseError::NoSuchDay(_))));
        assert!(matches!("29-02-2023".parse::<CalendarDate>(), Err(DateParseError::NoSuchDay(_))));
        assert!(matches!("01-13-2024".parse::<CalendarDate>(), Err(DateParseError::NoSuchDay(_))));
    }
}
