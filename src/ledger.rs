//! Reservation schedules for a single parking slot: the text encoding kept in
//! the `ReservedDates` column, coverage queries, and the opt-out split.
//!
//! ```text
//! schedule = "None" | "Always" | DATE | segment (" ; " segment)*
//! segment  = DATE "--" (DATE | "Always")
//! ```
//!
//! Sentinels are matched case-insensitively. Segments keep the order they
//! were written in and are not checked for overlap or inversion.

use std::fmt;
use std::str::FromStr;

use crate::dates::{CalendarDate, DateParseError};
use crate::model::Status;

const NONE_TOKEN: &str = "None";
const ALWAYS_TOKEN: &str = "Always";
const RANGE_SEP: &str = "--";
const SEGMENT_SEP: &str = " ; ";

/// Where a segment stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Date(CalendarDate),
    Always,
}

impl Bound {
    fn admits(self, date: CalendarDate) -> bool {
        match self {
            Bound::Date(end) => date <= end,
            Bound::Always => true,
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Date(d) => write!(f, "{d}"),
            Bound::Always => f.write_str(ALWAYS_TOKEN),
        }
    }
}

/// Inclusive run of reserved days, open-ended when `end` is `Always`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub start: CalendarDate,
    pub end: Bound,
}

impl Segment {
    pub fn new(start: CalendarDate, end: Bound) -> Self {
        Self { start, end }
    }

    pub fn covers(&self, date: CalendarDate) -> bool {
        self.start <= date && self.end.admits(date)
    }

    pub fn covers_range(&self, start: CalendarDate, end: CalendarDate) -> bool {
        self.start <= start && self.end.admits(end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// No reservation.
    None,
    /// Permanent reservation.
    Always,
    /// A single reserved day, written as the bare date.
    Day(CalendarDate),
    /// One or more segments in creation order. Build through
    /// [`Schedule::from_segments`], which never leaves this empty.
    Segments(Vec<Segment>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleParseError {
    Empty,
    BadDate { token: String, source: DateParseError },
    BadSegment(String),
}

impl fmt::Display for ScheduleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleParseError::Empty => write!(f, "empty schedule"),
            ScheduleParseError::BadDate { token, source } => write!(f, "bad date {token:?} in schedule: {source}"),
            ScheduleParseError::BadSegment(s) => write!(f, "bad segment {s:?}, expected START--END"),
        }
    }
}

impl std::error::Error for ScheduleParseError {}

fn parse_date(token: &str) -> Result<CalendarDate, ScheduleParseError> {
    token.parse().map_err(|source| ScheduleParseError::BadDate {
        token: token.to_string(),
        source,
    })
}

fn parse_segment(text: &str) -> Result<Segment, ScheduleParseError> {
    let bad = || ScheduleParseError::BadSegment(text.to_string());
    let (start, end) = text.split_once(RANGE_SEP).ok_or_else(bad)?;
    if end.contains(RANGE_SEP) {
        return Err(bad());
    }
    let start = parse_date(start.trim())?;
    let end = end.trim();
    let end = if end.eq_ignore_ascii_case(ALWAYS_TOKEN) {
        Bound::Always
    } else {
        Bound::Date(parse_date(end)?)
    };
    Ok(Segment::new(start, end))
}

impl FromStr for Schedule {
    type Err = ScheduleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(ScheduleParseError::Empty);
        }
        if text.eq_ignore_ascii_case(NONE_TOKEN) {
            return Ok(Schedule::None);
        }
        if text.eq_ignore_ascii_case(ALWAYS_TOKEN) {
            return Ok(Schedule::Always);
        }
        if !text.contains(RANGE_SEP) && !text.contains(';') {
            return parse_date(text).map(Schedule::Day);
        }
        let segments = text
            .split(';')
            .map(|seg| parse_segment(seg.trim()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Schedule::from_segments(segments))
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::None => f.write_str(NONE_TOKEN),
            Schedule::Always => f.write_str(ALWAYS_TOKEN),
            Schedule::Day(d) => write!(f, "{d}"),
            Schedule::Segments(segments) if segments.is_empty() => f.write_str(NONE_TOKEN),
            Schedule::Segments(segments) => {
                for (i, seg) in segments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(SEGMENT_SEP)?;
                    }
                    write!(f, "{}{RANGE_SEP}{}", seg.start, seg.end)?;
                }
                Ok(())
            }
        }
    }
}

impl Schedule {
    pub fn range(start: CalendarDate, end: CalendarDate) -> Self {
        Schedule::from_segments(vec![Segment::new(start, Bound::Date(end))])
    }

    /// An empty list is no reservation at all.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        if segments.is_empty() {
            Schedule::None
        } else {
            Schedule::Segments(segments)
        }
    }

    pub fn is_none(&self) -> bool {
        match self {
            Schedule::None => true,
            Schedule::Segments(segments) => segments.is_empty(),
            _ => false,
        }
    }

    pub fn is_covered_on(&self, date: CalendarDate) -> bool {
        match self {
            Schedule::None => false,
            Schedule::Always => true,
            Schedule::Day(d) => *d == date,
            Schedule::Segments(segments) => segments.iter().any(|seg| seg.covers(date)),
        }
    }

    /// True iff a single segment holds the whole of `[start, end]`.
    pub fn is_covered_over_range(&self, start: CalendarDate, end: CalendarDate) -> bool {
        match self {
            Schedule::None => false,
            Schedule::Always => true,
            Schedule::Day(d) => *d <= start && end <= *d,
            Schedule::Segments(segments) => segments.iter().any(|seg| seg.covers_range(start, end)),
        }
    }

    /// End of the last segment: where the reservation originally ran to.
    /// `None` when nothing is reserved.
    pub fn final_end(&self) -> Option<Bound> {
        match self {
            Schedule::None => None,
            Schedule::Always => Some(Bound::Always),
            Schedule::Day(d) => Some(Bound::Date(*d)),
            Schedule::Segments(segments) => segments.last().map(|seg| seg.end),
        }
    }

    /// Release `request` from this schedule as of `today`.
    ///
    /// The result holds `[today, start-1]` and reopens from `end+1`. Holders
    /// with a non-discretionary status reopen permanently; "Other" holders
    /// only up to [`Schedule::final_end`] of the current schedule.
    /// Releasing `Always` clears the schedule.
    pub fn split_out(
        &self,
        request: DateRequest,
        status: Status,
        today: CalendarDate,
    ) -> Result<Schedule, NothingReserved> {
        let (start, end) = match request {
            DateRequest::Always => return Ok(Schedule::None),
            DateRequest::Day(d) => (d, d),
            DateRequest::Range(start, end) => (start, end),
        };
        let reopen_until = if status.is_discretionary() {
            self.final_end().ok_or(NothingReserved)?
        } else {
            Bound::Always
        };
        Ok(Schedule::from_segments(vec![
            Segment::new(today, Bound::Date(start.shift(-1))),
            Segment::new(end.shift(1), reopen_until),
        ]))
    }
}

/// The schedule being split has no reservation to resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NothingReserved;

impl fmt::Display for NothingReserved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("no reserved dates to open up")
    }
}

impl std::error::Error for NothingReserved {}

/// Gate check: does `schedule` entitle the holder to park on `on`?
pub fn has_active_reservation(schedule: &Schedule, on: CalendarDate) -> bool {
    schedule.is_covered_on(on)
}

/// What an operator asked for: `always`, one day, or `START--END`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRequest {
    Always,
    Day(CalendarDate),
    Range(CalendarDate, CalendarDate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestParseError {
    Empty,
    BadDate(DateParseError),
    /// `always` inside a range, or more than two `--` parts.
    BadShape(String),
}

impl fmt::Display for RequestParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestParseError::Empty => write!(f, "no date given"),
            RequestParseError::BadDate(e) => write!(f, "{e}"),
            RequestParseError::BadShape(s) => {
                write!(f, "unrecognised date request {s:?}, expected DD-MM-YYYY or DD-MM-YYYY--DD-MM-YYYY")
            }
        }
    }
}

impl std::error::Error for RequestParseError {}

impl FromStr for DateRequest {
    type Err = RequestParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(RequestParseError::Empty);
        }
        let parts: Vec<&str> = text.split(RANGE_SEP).map(str::trim).collect();
        match parts.as_slice() {
            [single] if single.eq_ignore_ascii_case(ALWAYS_TOKEN) => Ok(DateRequest::Always),
            [single] => single.parse().map(DateRequest::Day).map_err(RequestParseError::BadDate),
            [start, end] => {
                if start.eq_ignore_ascii_case(ALWAYS_TOKEN) || end.eq_ignore_ascii_case(ALWAYS_TOKEN) {
                    return Err(RequestParseError::BadShape(text.to_string()));
                }
                let start = start.parse().map_err(RequestParseError::BadDate)?;
                let end = end.parse().map_err(RequestParseError::BadDate)?;
                Ok(DateRequest::Range(start, end))
            }
            _ => Err(RequestParseError::BadShape(text.to_string())),
        }
    }
}

impl fmt::Display for DateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRequest::Always => f.write_str(ALWAYS_TOKEN),
            DateRequest::Day(d) => write!(f, "{d}"),
            DateRequest::Range(start, end) => write!(f, "{start}{RANGE_SEP}{end}"),
        }
    }
}
