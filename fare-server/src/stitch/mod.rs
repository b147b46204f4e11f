//! Window stitching.
//!
//! Answers "what is the cheapest fare on every day from `start` to `end`?"
//! against a service that only ever shows one short calendar window per
//! search. The stitcher requests a window, aligns it to the first wanted
//! day, then trims or extends with further windows until the run ends
//! exactly on `end`.

mod config;
mod series;
mod stitcher;


use chrono::NaiveDate;

use crate::calendar::WindowError;
use crate::domain::{DateError, DayLabel};
use crate::remote::RemoteError;

pub use config::StitchConfig;
pub use series::{FareSeries, StitchedResult};
pub use stitcher::{StitchQuery, Stitcher};

/// Error from stitching a date range.
#[derive(Debug, thiserror::Error)]
pub enum StitchError {
    /// The requested range ends before it starts
    #[error("invalid date range: {0}")]
    InvalidRange(#[from] DateError),

    /// A window never showed the day it had to start from
    #[error("no calendar day labelled {expected} to align to")]
    Alignment { expected: DayLabel },

    /// A search page had no day cells
    #[error("calendar window has no day cells")]
    EmptyWindow,

    /// Fetching a search page failed
    #[error("failed to fetch fare window: {0}")]
    Fetch(#[from] RemoteError),

    /// A search page could not be read as a calendar window
    #[error("malformed calendar window: {0}")]
    MalformedWindow(WindowError),

    /// Consecutive days are not consecutive dates
    #[error("calendar skips from {after} to {found}")]
    Discontinuous { after: NaiveDate, found: NaiveDate },

    /// Too many windows were needed
    #[error("gave up after {0} window fetches")]
    FetchLimit(usize),
}

impl From<WindowError> for StitchError {
    fn from(err: WindowError) -> Self {
        match err {
            WindowError::Empty => StitchError::EmptyWindow,
            other => StitchError::MalformedWindow(other),
        }
    }
}
