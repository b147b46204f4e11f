//! The seam between the stitcher and whatever serves search pages.

use std::future::Future;

use chrono::NaiveDate;

use crate::domain::{DateRange, Passengers, Route};

use super::error::RemoteError;

/// An open search session.
///
/// Cookies live in the client's cookie store; the session itself only
/// carries the anti-forgery token that every search must echo back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// One return-trip search: who flies, where, and the anchor dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchForm {
    pub passengers: Passengers,
    pub route: Route,
    /// Departure (start) and return (end) anchors.
    pub dates: DateRange,
}

impl SearchForm {
    pub fn new(passengers: Passengers, route: Route, dates: DateRange) -> Self {
        Self {
            passengers,
            route,
            dates,
        }
    }

    pub fn departure(&self) -> NaiveDate {
        self.dates.start()
    }

    pub fn return_date(&self) -> NaiveDate {
        self.dates.end()
    }
}

/// Source of raw search pages.
///
/// The stitcher only ever talks to this trait, so it can be driven by the
/// live client, the cache in front of it, or the mock.
pub trait FareSource {
    /// Acquire a session (cookies plus anti-forgery token).
    fn open_session(&self) -> impl Future<Output = Result<Session, RemoteError>> + Send;

    /// Submit one search and return the page body.
    fn search(
        &self,
        session: &Session,
        form: &SearchForm,
    ) -> impl Future<Output = Result<String, RemoteError>> + Send;
}
