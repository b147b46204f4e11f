//! Caller-facing fare queries.
//!
//! Two questions are answered: the lowest fares for one concrete return
//! trip, and the lowest fare on each day of a period (or just the cheapest
//! of those days).

use chrono::{Days, NaiveDate};
use tracing::info;

use crate::calendar::{DayFare, TripFares, WindowError, trip_fares};
use crate::domain::{DateError, DateRange, Passengers, Route};
use crate::remote::{FareSource, RemoteError, SearchForm};
use crate::stitch::{StitchConfig, StitchError, StitchQuery, StitchedResult, Stitcher};

/// Error from a fare query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The trip's dates are unusable
    #[error("invalid trip: {0}")]
    InvalidTrip(#[from] DateError),

    /// Fetching the search page failed
    #[error("failed to fetch fares: {0}")]
    Fetch(#[from] RemoteError),

    /// The search page could not be read
    #[error("unreadable search page: {0}")]
    Page(#[from] WindowError),

    /// Stitching the period failed
    #[error(transparent)]
    Stitch(#[from] StitchError),
}

/// A concrete return trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripQuery {
    pub passengers: Passengers,
    pub route: Route,
    pub departure: NaiveDate,
    /// Nights away; the return flight is `departure + nights`.
    pub nights: u32,
}

impl TripQuery {
    /// The departure and return dates.
    pub fn dates(&self) -> Result<DateRange, DateError> {
        let return_date = self
            .departure
            .checked_add_days(Days::new(self.nights as u64))
            .ok_or(DateError::InvalidRange {
                start: self.departure,
                end: self.departure,
            })?;
        DateRange::new(self.departure, return_date)
    }
}

/// Lowest outbound and return fares for one trip.
///
/// One search, no stitching: the fare tables of the search page already
/// hold every flight on the two days.
pub async fn lowest_fare_for_trip<S: FareSource>(
    source: &S,
    config: &StitchConfig,
    query: &TripQuery,
) -> Result<TripFares, QueryError> {
    let dates = query.dates()?;
    info!(route = %query.route, dates = %dates, "looking up trip fares");

    let session = source.open_session().await?;
    let form = SearchForm::new(query.passengers, query.route, dates);
    let page = source.search(&session, &form).await?;

    Ok(trip_fares(&page, &config.fare_class)?)
}

/// What a period query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodMode {
    /// The fare on every day of the period.
    #[default]
    AllDays,
    /// Only the cheapest day.
    Cheapest,
}

/// A period of days to price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodQuery {
    pub passengers: Passengers,
    pub route: Route,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Answer to a period query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodAnswer {
    AllDays(StitchedResult),
    /// `None` when every day of the period is sold out.
    Cheapest(Option<DayFare>),
}

/// Lowest fare on each day from `start` to `end` inclusive.
pub async fn fares_over_period<S: FareSource>(
    source: &S,
    config: &StitchConfig,
    query: &PeriodQuery,
    today: NaiveDate,
) -> Result<StitchedResult, QueryError> {
    let stitch_query = StitchQuery::new(query.passengers, query.route, query.start, query.end);
    Ok(Stitcher::new(source, config)
        .stitch(&stitch_query, today)
        .await?)
}

/// Lowest fares over a period, as every day or only the cheapest one.
pub async fn lowest_fare_over_period<S: FareSource>(
    source: &S,
    config: &StitchConfig,
    query: &PeriodQuery,
    mode: PeriodMode,
    today: NaiveDate,
) -> Result<PeriodAnswer, QueryError> {
    let result = fares_over_period(source, config, query, today).await?;

    Ok(match mode {
        PeriodMode::AllDays => PeriodAnswer::AllDays(result),
        PeriodMode::Cheapest => PeriodAnswer::Cheapest(result.cheapest().copied()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AirportCode, Fare};
    use crate::remote::MockFareClient;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn route() -> Route {
        Route::new(
            AirportCode::parse("MEL").unwrap(),
            AirportCode::parse("SYD").unwrap(),
        )
    }

    fn mock() -> MockFareClient {
        MockFareClient::new(date(2019, 4, 1)).with_window_days(5)
    }

    #[tokio::test]
    async fn trip_fares_for_departure_and_return() {
        let mock = mock().with_fare(date(2019, 5, 11), None);
        let query = TripQuery {
            passengers: Passengers::new(2, 0),
            route: route(),
            departure: date(2019, 5, 4),
            nights: 7,
        };

        let fares = lowest_fare_for_trip(&mock, &StitchConfig::default(), &query)
            .await
            .unwrap();

        assert_eq!(fares.outbound, mock.fare_on(date(2019, 5, 4)));
        assert_eq!(fares.inbound, None);

        let searches = mock.searches().await;
        assert_eq!(searches.len(), 1);
        assert_eq!(searches[0].return_date(), date(2019, 5, 11));
    }

    #[tokio::test]
    async fn zero_nights_is_a_same_day_return() {
        let mock = mock();
        let query = TripQuery {
            passengers: Passengers::default(),
            route: route(),
            departure: date(2019, 5, 4),
            nights: 0,
        };
        assert_eq!(query.dates().unwrap().len_days(), 1);

        let fares = lowest_fare_for_trip(&mock, &StitchConfig::default(), &query)
            .await
            .unwrap();
        assert_eq!(fares.outbound, fares.inbound);
    }

    #[tokio::test]
    async fn period_all_days() {
        let mock = mock();
        let query = PeriodQuery {
            passengers: Passengers::default(),
            route: route(),
            start: date(2019, 5, 1),
            end: date(2019, 5, 10),
        };

        let answer = lowest_fare_over_period(
            &mock,
            &StitchConfig::default(),
            &query,
            PeriodMode::AllDays,
            mock.today(),
        )
        .await
        .unwrap();

        let PeriodAnswer::AllDays(result) = answer else {
            panic!("expected all days");
        };
        assert_eq!(result.len(), 10);
    }

    #[tokio::test]
    async fn period_cheapest_day() {
        let cheapest = date(2019, 5, 7);
        let mock = mock().with_fare(cheapest, Some(Fare::from_minor_units(999)));
        let query = PeriodQuery {
            passengers: Passengers::default(),
            route: route(),
            start: date(2019, 5, 1),
            end: date(2019, 5, 10),
        };

        let answer = lowest_fare_over_period(
            &mock,
            &StitchConfig::default(),
            &query,
            PeriodMode::Cheapest,
            mock.today(),
        )
        .await
        .unwrap();

        match answer {
            PeriodAnswer::Cheapest(Some(day)) => {
                assert_eq!(day.date, cheapest);
                assert_eq!(day.fare, Some(Fare::from_minor_units(999)));
            }
            other => panic!("unexpected answer {other:?}"),
        }
    }

    #[tokio::test]
    async fn period_errors_pass_through() {
        let mock = mock();
        let query = PeriodQuery {
            passengers: Passengers::default(),
            route: route(),
            start: date(2019, 5, 10),
            end: date(2019, 5, 1),
        };

        let err = lowest_fare_over_period(
            &mock,
            &StitchConfig::default(),
            &query,
            PeriodMode::AllDays,
            mock.today(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, QueryError::Stitch(StitchError::InvalidRange(_))));
        assert_eq!(mock.search_count().await, 0);
    }
}
