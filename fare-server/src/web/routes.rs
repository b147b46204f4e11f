//! HTTP route handlers.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use tower_http::services::ServeDir;
use tracing::{error, info, warn};

use crate::chart::{ChartError, render_trend_chart, write_trend_chart};
use crate::domain::{AirportCode, Passengers, Route};
use crate::query::{
    PeriodAnswer, PeriodMode, PeriodQuery, QueryError, TripQuery, fares_over_period,
    lowest_fare_for_trip, lowest_fare_over_period,
};
use crate::stitch::StitchError;

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Create the application router.
///
/// `static_dir` is the path to the static assets directory.
pub fn create_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/api/fares/trip", get(trip_fares))
        .route("/api/fares/period", get(period_fares))
        .route("/fares/trend", get(trend_page))
        .nest_service("/static", ServeDir::new(static_dir))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Index page with query forms.
async fn index_page() -> impl IntoResponse {
    Html(
        IndexTemplate
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e)),
    )
}

fn parse_route(origin: &str, destination: &str) -> Result<Route, AppError> {
    let origin = AirportCode::parse_normalized(origin).map_err(|_| AppError::BadRequest {
        message: format!("Invalid origin airport: {}", origin),
    })?;
    let destination =
        AirportCode::parse_normalized(destination).map_err(|_| AppError::BadRequest {
            message: format!("Invalid destination airport: {}", destination),
        })?;
    if origin == destination {
        return Err(AppError::BadRequest {
            message: "Origin and destination must differ".to_string(),
        });
    }
    Ok(Route::new(origin, destination))
}

fn parse_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| AppError::BadRequest {
        message: format!("Invalid {field} date (expected YYYY-MM-DD): {value}"),
    })
}

fn parse_passengers(adults: Option<u8>, children: Option<u8>) -> Result<Passengers, AppError> {
    let passengers = Passengers::new(adults.unwrap_or(1), children.unwrap_or(0));
    if passengers.adults == 0 {
        return Err(AppError::BadRequest {
            message: "At least one adult is required".to_string(),
        });
    }
    Ok(passengers)
}

/// Lowest fares for one return trip.
async fn trip_fares(
    State(state): State<AppState>,
    Query(req): Query<TripRequest>,
) -> Result<Json<TripResponse>, AppError> {
    let query = TripQuery {
        passengers: parse_passengers(req.adults, req.children)?,
        route: parse_route(&req.origin, &req.destination)?,
        departure: parse_date("departure", &req.departure)?,
        nights: req.nights,
    };
    let dates = query.dates().map_err(|e| AppError::BadRequest {
        message: e.to_string(),
    })?;

    let fares = lowest_fare_for_trip(state.fares.as_ref(), &state.config, &query).await?;

    Ok(Json(TripResponse::new(&query.route, &dates, &fares)))
}

fn period_query(req: &PeriodRequest) -> Result<PeriodQuery, AppError> {
    Ok(PeriodQuery {
        passengers: parse_passengers(req.adults, req.children)?,
        route: parse_route(&req.origin, &req.destination)?,
        start: parse_date("start", &req.start)?,
        end: parse_date("end", &req.end)?,
    })
}

/// Lowest fare on each day of a period, or only the cheapest day.
async fn period_fares(
    State(state): State<AppState>,
    Query(req): Query<PeriodRequest>,
) -> Result<Json<PeriodResponse>, AppError> {
    let query = period_query(&req)?;
    let mode = if req.all_days.unwrap_or(true) {
        PeriodMode::AllDays
    } else {
        PeriodMode::Cheapest
    };

    let today = state.config.today();
    let answer =
        lowest_fare_over_period(state.fares.as_ref(), &state.config, &query, mode, today).await?;

    Ok(Json(match answer {
        PeriodAnswer::AllDays(result) => PeriodResponse::all_days(&query, &result),
        PeriodAnswer::Cheapest(day) => PeriodResponse::cheapest_only(&query, day.as_ref()),
    }))
}

/// Fare trend chart page for a period.
async fn trend_page(State(state): State<AppState>, Query(req): Query<PeriodRequest>) -> Response {
    match render_trend(&state, &req).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => e.into_html_response(),
    }
}

async fn render_trend(state: &AppState, req: &PeriodRequest) -> Result<String, AppError> {
    let query = period_query(req)?;
    let today = state.config.today();
    let result = fares_over_period(state.fares.as_ref(), &state.config, &query, today).await?;

    let title = format!("{} lowest fares, {} to {}", query.route, query.start, query.end);
    if let Some(dir) = &state.chart_dir {
        let path = dir.join(format!("{}_{}_{}.html", query.route, query.start, query.end));
        write_trend_chart(&path, &result, &title)?;
        info!(path = %path.display(), "saved trend chart");
    }
    Ok(render_trend_chart(&result, &title)?)
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    BadGateway { message: String },
    Internal { message: String },
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, &str) {
        match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        }
    }

    fn log(&self) {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!(%status, reason = message, "request failed");
        } else {
            warn!(%status, reason = message, "request rejected");
        }
    }

    /// Render as an HTML error page instead of JSON.
    fn into_html_response(self) -> Response {
        self.log();
        let (status, message) = self.status_and_message();
        let page = ErrorTemplate {
            title: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: message.to_string(),
        };
        let html = page
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e));
        (status, Html(html)).into_response()
    }
}

impl From<StitchError> for AppError {
    fn from(e: StitchError) -> Self {
        let message = e.to_string();
        match e {
            StitchError::InvalidRange(_) => AppError::BadRequest { message },
            StitchError::Alignment { .. } => AppError::NotFound { message },
            StitchError::Fetch(_)
            | StitchError::EmptyWindow
            | StitchError::MalformedWindow(_)
            | StitchError::Discontinuous { .. } => AppError::BadGateway { message },
            StitchError::FetchLimit(_) => AppError::Internal { message },
        }
    }
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        let message = e.to_string();
        match e {
            QueryError::Stitch(e) => e.into(),
            QueryError::InvalidTrip(_) => AppError::BadRequest { message },
            QueryError::Fetch(_) | QueryError::Page(_) => AppError::BadGateway { message },
        }
    }
}

impl From<ChartError> for AppError {
    fn from(e: ChartError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        self.log();
        let (status, message) = self.status_and_message();
        let body = Json(ErrorResponse {
            error: message.to_string(),
        });
        (status, body).into_response()
    }
}
