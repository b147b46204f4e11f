//! Web layer for the fare calendar.
//!
//! Provides a JSON API for trip and period queries, and HTML pages for
//! the query form and fare trend charts.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, FareBackend};
pub use templates::*;
