//! The stitching loop.

use std::cmp::Ordering;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info};

use crate::calendar::{CalendarWindow, DayFare};
use crate::domain::{DateRange, DayLabel, Passengers, Route, days_between};
use crate::remote::{FareSource, SearchForm, Session};

use super::config::StitchConfig;
use super::series::{FareSeries, StitchedResult};
use super::StitchError;

/// A period query: who flies, where, and the inclusive day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StitchQuery {
    pub passengers: Passengers,
    pub route: Route,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl StitchQuery {
    pub fn new(passengers: Passengers, route: Route, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            passengers,
            route,
            start,
            end,
        }
    }
}

/// Reconstructs a per-day fare series from calendar windows.
pub struct Stitcher<'a, S: FareSource> {
    source: &'a S,
    config: &'a StitchConfig,
}

/// Per-query state: the open session and the fetch budget.
struct Run<'q> {
    session: Session,
    query: &'q StitchQuery,
    today: NaiveDate,
    fetches: usize,
}

impl<'a, S: FareSource> Stitcher<'a, S> {
    /// Create a new stitcher.
    pub fn new(source: &'a S, config: &'a StitchConfig) -> Self {
        Self { source, config }
    }

    /// Fares for every day of `query.start..=query.end`.
    ///
    /// Windows are fetched one at a time. Any error aborts the whole query;
    /// a partial series is never returned.
    pub async fn stitch(
        &self,
        query: &StitchQuery,
        today: NaiveDate,
    ) -> Result<StitchedResult, StitchError> {
        let range = DateRange::new(query.start, query.end)?;
        // Past days are never rendered, so no window could align.
        if range.start() < today {
            return Err(StitchError::Alignment {
                expected: DayLabel::of(range.start()),
            });
        }

        // The calendar shows days after the departure anchor, so pad the
        // anchors by a day unless that would step onto today.
        let anchor_start = if range.start() == today {
            today
        } else {
            range.start() - Duration::days(1)
        };
        let anchor_end = if range.end() == today {
            today
        } else {
            range.end() + Duration::days(1)
        };

        info!(
            route = %query.route,
            range = %range,
            "stitching fare calendar"
        );

        let mut run = Run {
            session: self.source.open_session().await?,
            query,
            today,
            fetches: 0,
        };

        let window = self
            .fetch(&mut run, DateRange::new(anchor_start, anchor_end)?)
            .await?;
        let mut days = window.resolve_days(None)?;

        // Today never appears in the calendar row; its fare is the heading.
        if range.start() == today && !days.iter().any(|d| d.date == today) {
            let fare = window.heading().departing().flatten();
            days.insert(0, DayFare::new(today, fare));
        }

        let mut series = FareSeries::aligned(days, range.start())?;

        loop {
            let last = series.last_date();
            match last.cmp(&range.end()) {
                Ordering::Greater => {
                    let excess = days_between(range.end(), last)? - 1;
                    debug!(%last, excess, "trimming past requested end");
                    series = series.trimmed(excess as usize);
                }
                Ordering::Less => {
                    let anchors = DateRange::new(last, anchor_end)?;
                    let window = self.fetch(&mut run, anchors).await?;
                    let next = FareSeries::aligned(
                        window.resolve_days(Some(last))?,
                        last + Duration::days(1),
                    )?;
                    series = series.splice(next)?;
                }
                Ordering::Equal => {
                    info!(days = series.len(), fetches = run.fetches, "fare calendar stitched");
                    return Ok(series.into_result());
                }
            }
        }
    }

    async fn fetch(
        &self,
        run: &mut Run<'_>,
        anchors: DateRange,
    ) -> Result<CalendarWindow, StitchError> {
        if run.fetches >= self.config.max_fetches {
            return Err(StitchError::FetchLimit(run.fetches));
        }
        run.fetches += 1;

        debug!(anchors = %anchors, fetch = run.fetches, "requesting calendar window");
        let form = SearchForm::new(run.query.passengers, run.query.route, anchors);
        let page = self.source.search(&run.session, &form).await?;

        Ok(CalendarWindow::parse(
            &page,
            anchors,
            run.today,
            &self.config.fare_class,
        )?)
    }
}
