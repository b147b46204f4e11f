//! Parsing of fare search pages.
//!
//! A search page carries two things this crate reads:
//!
//! - the fare tables for the searched outbound and return days
//!   (`table#table-0`, `table#table-1`), used for point queries and for
//!   today's fare, which never appears in the calendar row;
//! - the calendar row (`div.date-row`), a short run of day cells with the
//!   cheapest fare per day, framed by previous/next navigation cells.
//!
//! Day cells are labelled "Sat, 04 May" with no year. The `data-new-date`
//! attribute is the only year-bearing signal, so [`CalendarWindow`] keeps
//! it per cell and resolves years when turning cells into [`DayFare`]s.

mod selector;
mod window;

use chrono::NaiveDate;

use crate::domain::{DateError, DayLabel};

pub use selector::{
    DEFAULT_FARE_CLASS, OUTBOUND_TABLE_ID, RETURN_TABLE_ID, TripFares, lowest_fare,
    lowest_fare_in_table, trip_fares,
};
pub use window::{CalendarWindow, DayCell, DayFare, FareCell, Heading, Nav};

/// Errors from parsing a search page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    /// The calendar row is missing or has no day cells.
    #[error("calendar window has no day cells")]
    Empty,

    /// A fare table the page should contain is missing.
    #[error("fare table '{0}' not found")]
    MissingTable(String),

    /// A day label or raw date attribute could not be parsed.
    #[error("bad calendar cell: {0}")]
    Cell(#[from] DateError),

    /// No cell carries a raw date and no earlier date is known.
    #[error("no cell carries a raw date to resolve the year from")]
    NoYearAnchor,

    /// A label names a day that does not exist in the resolved year.
    #[error("label {label} does not exist in {year}")]
    NoSuchDay { label: DayLabel, year: i32 },

    /// A label disagrees with the date resolved for it.
    #[error("label {label} does not match resolved date {date}")]
    Inconsistent { label: DayLabel, date: NaiveDate },
}
