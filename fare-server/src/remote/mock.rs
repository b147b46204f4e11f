//! Mock fare service for testing without network access.
//!
//! Renders search pages with the same markup as the booking site: fare
//! tables for the two anchor days and a fixed-size calendar row. The row
//! starts a few days before the departure anchor but never on or before
//! today, which reproduces the site's anchor shift when searching from
//! today.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{DayLabel, Fare, format_raw_date};

use super::error::RemoteError;
use super::source::{FareSource, SearchForm, Session};

const MOCK_TOKEN: &str = "mock-session-token";

/// Which day cells carry a `data-new-date` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawDates {
    /// Every day cell.
    #[default]
    All,
    /// Only the first day cell of each window.
    FirstOnly,
    /// Every day cell of the first page served, none afterwards.
    FirstSearchOnly,
    /// No cell at all.
    Never,
}

/// Mock fare service serving synthetic search pages.
///
/// Fares are deterministic per date unless overridden. Every search is
/// recorded so tests can assert on how many windows were requested.
#[derive(Debug, Clone)]
pub struct MockFareClient {
    today: NaiveDate,
    window_days: u32,
    lead_days: u32,
    raw_dates: RawDates,
    fares: BTreeMap<NaiveDate, Option<Fare>>,
    missing_days: BTreeSet<NaiveDate>,
    fail_after: Option<usize>,
    searches: Arc<Mutex<Vec<SearchForm>>>,
}

impl MockFareClient {
    /// A mock whose calendar row shows seven days starting one day before
    /// the departure anchor.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            window_days: 7,
            lead_days: 1,
            raw_dates: RawDates::All,
            fares: BTreeMap::new(),
            missing_days: BTreeSet::new(),
            fail_after: None,
            searches: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of day cells per calendar row.
    pub fn with_window_days(mut self, days: u32) -> Self {
        self.window_days = days.max(1);
        self
    }

    /// How many days before the departure anchor the row starts.
    pub fn with_lead_days(mut self, days: u32) -> Self {
        self.lead_days = days;
        self
    }

    pub fn with_raw_dates(mut self, raw_dates: RawDates) -> Self {
        self.raw_dates = raw_dates;
        self
    }

    /// Override the fare for a day; `None` renders the day as sold out.
    pub fn with_fare(mut self, date: NaiveDate, fare: Option<Fare>) -> Self {
        self.fares.insert(date, fare);
        self
    }

    /// Leave a day out of every calendar row.
    pub fn with_missing_day(mut self, date: NaiveDate) -> Self {
        self.missing_days.insert(date);
        self
    }

    /// Fail every search after the first `n`.
    pub fn with_failure_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// The fare shown for `date`.
    pub fn fare_on(&self, date: NaiveDate) -> Option<Fare> {
        match self.fares.get(&date) {
            Some(fare) => *fare,
            None => Some(default_fare(date)),
        }
    }

    /// Searches submitted so far, in order.
    pub async fn searches(&self) -> Vec<SearchForm> {
        self.searches.lock().await.clone()
    }

    pub async fn search_count(&self) -> usize {
        self.searches.lock().await.len()
    }

    /// Days the calendar row shows for a departure anchor.
    pub fn window_for(&self, departure: NaiveDate) -> Vec<NaiveDate> {
        let earliest = self.today + Duration::days(1);
        let first = (departure - Duration::days(self.lead_days as i64)).max(earliest);

        (0..self.window_days as i64)
            .map(|i| first + Duration::days(i))
            .filter(|d| !self.missing_days.contains(d))
            .collect()
    }

    /// Render the page for the `nth` search (zero-based).
    fn render(&self, form: &SearchForm, nth: usize) -> String {
        let mut page = String::from("<html><body><form id=\"search\">\n");

        page.push_str(&fare_table("table-0", self.fare_on(form.departure())));
        page.push_str(&fare_table("table-1", self.fare_on(form.return_date())));

        page.push_str("<div class=\"date-row\"><ul>\n");
        page.push_str(&sentinel("prevDay"));
        for (i, day) in self.window_for(form.departure()).into_iter().enumerate() {
            let raw = match self.raw_dates {
                RawDates::All => format_raw_date(day),
                RawDates::FirstOnly if i == 0 => format_raw_date(day),
                RawDates::FirstSearchOnly if nth == 0 => format_raw_date(day),
                _ => String::new(),
            };
            let fare = match self.fare_on(day) {
                Some(fare) => format!("${fare}"),
                None => "Sold out".to_string(),
            };
            let _ = writeln!(
                page,
                r#"<li class="js-cal-date-change date-change" data-new-date="{raw}">{}<span class="lowest-day-fare">{fare}</span></li>"#,
                DayLabel::of(day)
            );
        }
        page.push_str(&sentinel("nextDay"));
        page.push_str("</ul></div>\n</form></body></html>\n");
        page
    }
}

impl FareSource for MockFareClient {
    async fn open_session(&self) -> Result<Session, RemoteError> {
        Ok(Session::new(MOCK_TOKEN))
    }

    async fn search(&self, session: &Session, form: &SearchForm) -> Result<String, RemoteError> {
        if session.token() != MOCK_TOKEN {
            return Err(RemoteError::Api {
                status: 400,
                message: "invalid request verification token".to_string(),
            });
        }

        let mut searches = self.searches.lock().await;
        if self.fail_after.is_some_and(|n| searches.len() >= n) {
            return Err(RemoteError::Api {
                status: 503,
                message: "mock failure".to_string(),
            });
        }
        let nth = searches.len();
        searches.push(*form);
        drop(searches);

        debug!(departure = %form.departure(), return_date = %form.return_date(), "serving mock search page");
        Ok(self.render(form, nth))
    }
}

/// Deterministic fare between 50.00 and 139.00.
fn default_fare(date: NaiveDate) -> Fare {
    let step = (date.ordinal() as u64 * 37 + date.year() as u64) % 90;
    Fare::from_minor_units(5000 + step * 100)
}

fn fare_table(id: &str, fare: Option<Fare>) -> String {
    let cells = match fare {
        Some(fare) => {
            let dearer = Fare::from_minor_units(fare.minor_units() + 1500);
            let flex = Fare::from_minor_units(fare.minor_units() + 6000);
            format!(
                r#"<td data-fare-type="Light Fare"><span class="currency">$</span>{dearer}</td>
<td data-fare-type="Light Fare"><span class="currency">$</span>{fare}</td>
<td data-fare-type="Flex Fare"><span class="currency">$</span>{flex}</td>"#
            )
        }
        None => r#"<td data-fare-type="Light Fare"><span class="fares-remaining">Sold out</span></td>"#
            .to_string(),
    };
    format!("<table id=\"{id}\"><tr>\n{cells}\n</tr></table>\n")
}

fn sentinel(class: &str) -> String {
    format!(
        "<li class=\"js-cal-date-change date-change\" data-new-date=\"\"><img class=\"{class}\" src=\"/img/{class}.png\"></li>\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{CalendarWindow, DEFAULT_FARE_CLASS, trip_fares};
    use crate::domain::{AirportCode, DateRange, Passengers, Route};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn form(start: NaiveDate, end: NaiveDate) -> SearchForm {
        SearchForm::new(
            Passengers::default(),
            Route::new(
                AirportCode::parse("MEL").unwrap(),
                AirportCode::parse("SYD").unwrap(),
            ),
            DateRange::new(start, end).unwrap(),
        )
    }

    #[tokio::test]
    async fn page_parses_as_a_window() {
        let mock = MockFareClient::new(date(2019, 4, 1)).with_window_days(5);
        let session = mock.open_session().await.unwrap();
        let f = form(date(2019, 5, 3), date(2019, 5, 11));

        let page = mock.search(&session, &f).await.unwrap();
        let window =
            CalendarWindow::parse(&page, f.dates, mock.today(), DEFAULT_FARE_CLASS).unwrap();
        let days = window.resolve_days(None).unwrap();

        let dates: Vec<_> = days.iter().map(|d| d.date).collect();
        assert_eq!(dates, mock.window_for(date(2019, 5, 3)));
        assert_eq!(dates[0], date(2019, 5, 2));
        assert_eq!(days[0].fare, mock.fare_on(date(2019, 5, 2)));
        assert_eq!(mock.search_count().await, 1);
    }

    #[tokio::test]
    async fn tables_show_anchor_day_fares() {
        let sold_out = date(2019, 5, 11);
        let mock = MockFareClient::new(date(2019, 4, 1)).with_fare(sold_out, None);
        let session = mock.open_session().await.unwrap();

        let page = mock
            .search(&session, &form(date(2019, 5, 3), sold_out))
            .await
            .unwrap();
        let fares = trip_fares(&page, DEFAULT_FARE_CLASS).unwrap();
        assert_eq!(fares.outbound, mock.fare_on(date(2019, 5, 3)));
        assert_eq!(fares.inbound, None);
    }

    #[test]
    fn window_never_includes_today() {
        let today = date(2019, 4, 1);
        let mock = MockFareClient::new(today).with_window_days(3).with_lead_days(2);

        assert_eq!(
            mock.window_for(today),
            vec![date(2019, 4, 2), date(2019, 4, 3), date(2019, 4, 4)]
        );
        assert_eq!(
            mock.window_for(date(2019, 4, 10)),
            vec![date(2019, 4, 8), date(2019, 4, 9), date(2019, 4, 10)]
        );
    }

    #[test]
    fn default_fares_are_stable() {
        let mock = MockFareClient::new(date(2019, 4, 1));
        let d = date(2019, 6, 1);
        assert_eq!(mock.fare_on(d), mock.fare_on(d));
        let fare = mock.fare_on(d).unwrap();
        assert!((5000..=13900).contains(&fare.minor_units()));
    }

    #[tokio::test]
    async fn failure_after_n_searches() {
        let mock = MockFareClient::new(date(2019, 4, 1)).with_failure_after(1);
        let session = mock.open_session().await.unwrap();
        let f = form(date(2019, 5, 3), date(2019, 5, 4));

        assert!(mock.search(&session, &f).await.is_ok());
        let err = mock.search(&session, &f).await.unwrap_err();
        assert!(matches!(err, RemoteError::Api { status: 503, .. }));
        assert_eq!(mock.search_count().await, 1);
    }

    #[tokio::test]
    async fn rejects_foreign_session() {
        let mock = MockFareClient::new(date(2019, 4, 1));
        let f = form(date(2019, 5, 3), date(2019, 5, 4));
        let err = mock.search(&Session::new("other"), &f).await.unwrap_err();
        assert!(matches!(err, RemoteError::Api { status: 400, .. }));
    }
}
