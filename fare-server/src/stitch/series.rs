//! Contiguous runs of days and the final stitched result.

use chrono::{Duration, NaiveDate};

use crate::calendar::DayFare;
use crate::domain::{DateRange, DayLabel, Fare};

use super::StitchError;

/// A non-empty, gapless, chronological run of days.
///
/// Values are never mutated in place: trimming and splicing consume the
/// series and return a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareSeries {
    days: Vec<DayFare>,
}

impl FareSeries {
    /// Build a series starting at `first`, dropping any earlier days.
    ///
    /// Fails with `Alignment` if no day is `first`, and with
    /// `Discontinuous` if the remaining days skip or repeat a date.
    pub fn aligned(days: Vec<DayFare>, first: NaiveDate) -> Result<Self, StitchError> {
        let start = days
            .iter()
            .position(|day| day.date == first)
            .ok_or(StitchError::Alignment {
                expected: DayLabel::of(first),
            })?;

        let days = days[start..].to_vec();
        for pair in days.windows(2) {
            if pair[1].date != pair[0].date + Duration::days(1) {
                return Err(StitchError::Discontinuous {
                    after: pair[0].date,
                    found: pair[1].date,
                });
            }
        }

        Ok(Self { days })
    }

    pub fn first_date(&self) -> NaiveDate {
        self.days[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.days[self.days.len() - 1].date
    }

    /// Never zero: `aligned` keeps at least the first day.
    pub(crate) fn len(&self) -> usize {
        self.days.len()
    }

    /// Drop `n` trailing days, always keeping the first.
    pub fn trimmed(mut self, n: usize) -> Self {
        let keep = self.days.len().saturating_sub(n).max(1);
        self.days.truncate(keep);
        self
    }

    /// Append a series that starts the day after this one ends.
    pub fn splice(mut self, next: FareSeries) -> Result<Self, StitchError> {
        let expected = self.last_date() + Duration::days(1);
        if next.first_date() != expected {
            return Err(StitchError::Discontinuous {
                after: self.last_date(),
                found: next.first_date(),
            });
        }
        self.days.extend(next.days);
        Ok(self)
    }

    pub fn into_result(self) -> StitchedResult {
        StitchedResult { days: self.days }
    }
}

/// The fare for every day of a requested range, in order.
///
/// Each entry pairs a resolved date with its label and fare, so the label,
/// fare and date sequences can never disagree in length.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StitchedResult {
    days: Vec<DayFare>,
}

impl StitchedResult {
    pub fn days(&self) -> &[DayFare] {
        &self.days
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn labels(&self) -> Vec<DayLabel> {
        self.days.iter().map(|d| d.label).collect()
    }

    pub fn fares(&self) -> Vec<Option<Fare>> {
        self.days.iter().map(|d| d.fare).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.days.iter().map(|d| d.date).collect()
    }

    /// (date, fare) pairs of the priced days, for charting.
    pub fn fare_points(&self) -> Vec<(NaiveDate, Fare)> {
        self.days
            .iter()
            .filter_map(|d| d.fare.map(|f| (d.date, f)))
            .collect()
    }

    /// The cheapest priced day; the earliest one wins a tie.
    pub fn cheapest(&self) -> Option<&DayFare> {
        self.days
            .iter()
            .filter(|d| d.fare.is_some())
            .min_by_key(|d| (d.fare, d.date))
    }

    /// The covered range, if any.
    pub fn range(&self) -> Option<DateRange> {
        let first = self.days.first()?;
        let last = self.days.last()?;
        DateRange::new(first.date, last.date).ok()
    }
}
