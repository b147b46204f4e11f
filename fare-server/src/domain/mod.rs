//! Domain types for the fare calendar.
//!
//! These types enforce their invariants at construction time: an
//! `AirportCode` is always three uppercase letters, a `DateRange` never
//! ends before it starts, and a `Fare` is an exact amount in cents.

mod airport;
mod dates;
mod fare;

pub use airport::{AirportCode, InvalidAirportCode, Route};
pub use dates::{
    DateError, DateRange, DayLabel, days_between, format_raw_date, months_between,
    parse_raw_date,
};
pub use fare::{Fare, InvalidFare, Passengers};
