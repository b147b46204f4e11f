//! Calendar arithmetic and the fare calendar's date formats.
//!
//! The fare calendar renders days as "Sat, 04 May" labels with no year.
//! Only some cells carry a machine-readable `YYYYMMDD` attribute, so most
//! of the year bookkeeping in the stitcher is built on the helpers here.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Month, NaiveDate, Weekday};

/// Errors from date parsing and date arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    /// The end of a range lies before its start.
    #[error("invalid range: {end} is before {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// A rendered day label could not be understood.
    #[error("invalid day label '{label}': {reason}")]
    InvalidLabel { label: String, reason: &'static str },

    /// A raw `YYYYMMDD` date attribute could not be understood.
    #[error("invalid raw date '{raw}': {reason}")]
    InvalidRawDate { raw: String, reason: &'static str },
}

/// Inclusive number of calendar days from `d1` to `d2`.
///
/// # Examples
///
/// ```
/// use fare_server::domain::days_between;
/// use chrono::NaiveDate;
///
/// let d = NaiveDate::from_ymd_opt(2019, 5, 4).unwrap();
/// assert_eq!(days_between(d, d).unwrap(), 1);
///
/// let later = NaiveDate::from_ymd_opt(2019, 5, 8).unwrap();
/// assert_eq!(days_between(d, later).unwrap(), 5);
/// assert!(days_between(later, d).is_err());
/// ```
pub fn days_between(d1: NaiveDate, d2: NaiveDate) -> Result<u32, DateError> {
    if d2 < d1 {
        return Err(DateError::InvalidRange { start: d1, end: d2 });
    }
    let span = d2.signed_duration_since(d1).num_days();
    Ok(span as u32 + 1)
}

/// Number of first-of-month boundaries crossed going from `d1` to `d2`.
///
/// # Examples
///
/// ```
/// use fare_server::domain::months_between;
/// use chrono::NaiveDate;
///
/// let d1 = NaiveDate::from_ymd_opt(2019, 12, 28).unwrap();
/// let d2 = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
/// assert_eq!(months_between(d1, d2).unwrap(), 2);
/// assert_eq!(months_between(d1, d1).unwrap(), 0);
/// ```
pub fn months_between(d1: NaiveDate, d2: NaiveDate) -> Result<u32, DateError> {
    if d2 < d1 {
        return Err(DateError::InvalidRange { start: d1, end: d2 });
    }
    let index = |d: NaiveDate| d.year() as i64 * 12 + d.month0() as i64;
    Ok((index(d2) - index(d1)) as u32)
}

/// An ordered, validated pair of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `end < start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateError> {
        if end < start {
            return Err(DateError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive number of days in the range (always at least 1).
    pub fn len_days(&self) -> u32 {
        // Construction guarantees start <= end.
        days_between(self.start, self.end).unwrap_or(1)
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// A calendar cell label: weekday, day of month and month, without a year.
///
/// Rendered as `"Sat, 04 May"`, the same shape as chrono's `"%a, %d %b"`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DayLabel {
    weekday: Weekday,
    day: u32,
    month: Month,
}

impl DayLabel {
    /// The label the calendar renders for `date`.
    pub fn of(date: NaiveDate) -> Self {
        let month = Month::try_from(date.month() as u8).unwrap_or(Month::January);
        Self {
            weekday: date.weekday(),
            day: date.day(),
            month,
        }
    }

    /// Parse a rendered label such as `"Sat, 04 May"`.
    ///
    /// Whitespace (including line breaks from the markup) is tolerated, and
    /// weekday/month names are case-insensitive.
    pub fn parse(s: &str) -> Result<Self, DateError> {
        let invalid = |reason| DateError::InvalidLabel {
            label: s.trim().to_string(),
            reason,
        };

        let cleaned = s.replace(',', " ");
        let parts: Vec<&str> = cleaned.split_whitespace().collect();
        let [weekday, day, month] = parts.as_slice() else {
            return Err(invalid("expected 'Www, DD Mmm'"));
        };

        let weekday = Weekday::from_str(weekday).map_err(|_| invalid("unknown weekday"))?;
        let day: u32 = day.parse().map_err(|_| invalid("day is not a number"))?;
        if !(1..=31).contains(&day) {
            return Err(invalid("day must be 1-31"));
        }
        let month = Month::from_str(month).map_err(|_| invalid("unknown month"))?;

        Ok(Self {
            weekday,
            day,
            month,
        })
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Month number, 1-12.
    pub fn month(&self) -> u32 {
        self.month.number_from_month()
    }

    /// The concrete date this label names in `year`, if it exists.
    ///
    /// The weekday is not checked; see [`DayLabel::matches`].
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month(), self.day)
    }

    /// Whether `date` renders to exactly this label.
    pub fn matches(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }
}

impl fmt::Display for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {:02} {}",
            self.weekday,
            self.day,
            &self.month.name()[..3]
        )
    }
}

impl fmt::Debug for DayLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DayLabel({self})")
    }
}

/// Parse the calendar's raw `YYYYMMDD` date attribute.
pub fn parse_raw_date(raw: &str) -> Result<NaiveDate, DateError> {
    let invalid = |reason| DateError::InvalidRawDate {
        raw: raw.to_string(),
        reason,
    };

    let raw = raw.trim();
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected 8 digits"));
    }

    NaiveDate::parse_from_str(raw, "%Y%m%d").map_err(|_| invalid("not a calendar date"))
}

/// Format a date the way the calendar's raw date attribute does.
pub fn format_raw_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
