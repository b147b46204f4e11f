//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::calendar::{DayFare, TripFares};
use crate::domain::{DateRange, Route};
use crate::query::PeriodQuery;
use crate::stitch::StitchedResult;

/// Request for the lowest fares of one return trip.
#[derive(Debug, Deserialize)]
pub struct TripRequest {
    /// Origin airport code
    pub origin: String,

    /// Destination airport code
    pub destination: String,

    /// Adult passengers (default 1)
    pub adults: Option<u8>,

    /// Child passengers (default 0)
    pub children: Option<u8>,

    /// Departure date, YYYY-MM-DD
    pub departure: String,

    /// Nights before the return flight
    pub nights: u32,
}

/// Request for the lowest fare on each day of a period.
#[derive(Debug, Deserialize)]
pub struct PeriodRequest {
    pub origin: String,
    pub destination: String,
    pub adults: Option<u8>,
    pub children: Option<u8>,

    /// First day, YYYY-MM-DD
    pub start: String,

    /// Last day (inclusive), YYYY-MM-DD
    pub end: String,

    /// Return every day (default) or only the cheapest one
    pub all_days: Option<bool>,
}

/// Lowest fares of one return trip.
#[derive(Debug, Serialize)]
pub struct TripResponse {
    pub route: String,
    pub departure: String,
    pub return_date: String,

    /// Lowest outbound fare; absent when sold out
    pub outbound: Option<String>,

    /// Lowest return fare; absent when sold out
    pub inbound: Option<String>,
}

impl TripResponse {
    pub fn new(route: &Route, dates: &DateRange, fares: &TripFares) -> Self {
        Self {
            route: route.to_string(),
            departure: dates.start().to_string(),
            return_date: dates.end().to_string(),
            outbound: fares.outbound.map(|f| f.to_string()),
            inbound: fares.inbound.map(|f| f.to_string()),
        }
    }
}

/// One day of a period answer.
#[derive(Debug, Serialize)]
pub struct DayFareResult {
    /// Resolved date, YYYY-MM-DD
    pub date: String,

    /// Label as the calendar renders it ("Sat, 04 May")
    pub label: String,

    /// Lowest fare; absent when sold out
    pub fare: Option<String>,
}

impl From<&DayFare> for DayFareResult {
    fn from(day: &DayFare) -> Self {
        Self {
            date: day.date.to_string(),
            label: day.label.to_string(),
            fare: day.fare.map(|f| f.to_string()),
        }
    }
}

/// Lowest fares over a period.
#[derive(Debug, Serialize)]
pub struct PeriodResponse {
    pub route: String,
    pub start: String,
    pub end: String,

    /// Every day of the period; empty when only the cheapest was asked for
    pub days: Vec<DayFareResult>,

    /// Cheapest priced day, if any
    pub cheapest: Option<DayFareResult>,
}

impl PeriodResponse {
    /// Every day of the period, plus the cheapest.
    pub fn all_days(query: &PeriodQuery, result: &StitchedResult) -> Self {
        Self {
            route: query.route.to_string(),
            start: query.start.to_string(),
            end: query.end.to_string(),
            days: result.days().iter().map(DayFareResult::from).collect(),
            cheapest: result.cheapest().map(DayFareResult::from),
        }
    }

    /// Only the cheapest day of the period.
    pub fn cheapest_only(query: &PeriodQuery, cheapest: Option<&DayFare>) -> Self {
        Self {
            route: query.route.to_string(),
            start: query.start.to_string(),
            end: query.end.to_string(),
            days: Vec::new(),
            cheapest: cheapest.map(DayFareResult::from),
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AirportCode, Fare, Passengers};
    use crate::stitch::FareSeries;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn query() -> PeriodQuery {
        PeriodQuery {
            passengers: Passengers::default(),
            route: Route::new(
                AirportCode::parse("MEL").unwrap(),
                AirportCode::parse("SYD").unwrap(),
            ),
            start: date(2019, 5, 3),
            end: date(2019, 5, 4),
        }
    }

    #[test]
    fn period_response_json() {
        let days = vec![
            DayFare::new(date(2019, 5, 3), Some(Fare::from_minor_units(9550))),
            DayFare::new(date(2019, 5, 4), None),
        ];
        let result = FareSeries::aligned(days, date(2019, 5, 3))
            .unwrap()
            .into_result();

        let json = serde_json::to_value(PeriodResponse::all_days(&query(), &result)).unwrap();

        assert_eq!(json["route"], "MEL-SYD");
        assert_eq!(json["days"][0]["label"], "Fri, 03 May");
        assert_eq!(json["days"][0]["fare"], "95.50");
        assert!(json["days"][1]["fare"].is_null());
        assert_eq!(json["cheapest"]["date"], "2019-05-03");
    }

    #[test]
    fn cheapest_only_has_no_days() {
        let json = serde_json::to_value(PeriodResponse::cheapest_only(&query(), None)).unwrap();
        assert_eq!(json["days"].as_array().unwrap().len(), 0);
        assert!(json["cheapest"].is_null());
    }

    #[test]
    fn period_request_from_query_string() {
        let req: PeriodRequest = serde_json::from_value(serde_json::json!({
            "origin": "MEL",
            "destination": "SYD",
            "start": "2019-05-01",
            "end": "2019-05-10",
            "all_days": false
        }))
        .unwrap();
        assert_eq!(req.adults, None);
        assert_eq!(req.all_days, Some(false));
    }
}
