//! Lowest-fare selection over a one-direction fare table.
//!
//! The search page lists every flight for the requested day in a fare
//! table, one `<td>` per flight and fare class. Only base-class cells that
//! still show a price count towards the day's lowest fare.

use tracing::trace;

use crate::domain::Fare;
use crate::html::{self, Element};

use super::WindowError;

/// Fare class whose cells are compared by default.
pub const DEFAULT_FARE_CLASS: &str = "Light Fare";

/// Id of the outbound fare table.
pub const OUTBOUND_TABLE_ID: &str = "table-0";

/// Id of the return fare table.
pub const RETURN_TABLE_ID: &str = "table-1";

/// Lowest fares for the two directions of a return search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripFares {
    /// Lowest outbound fare, `None` when the day is sold out.
    pub outbound: Option<Fare>,
    /// Lowest return fare, `None` when the day is sold out.
    pub inbound: Option<Fare>,
}

/// Return the lowest eligible fare in a fare table.
///
/// A cell is eligible when its `data-fare-type` is `fare_class`, it shows a
/// currency marker, and it has no "fares remaining" (sold out) marker.
/// Returns `None` when nothing is eligible; that is the normal answer for
/// a sold-out day.
pub fn lowest_fare(table: &Element<'_>, fare_class: &str) -> Option<Fare> {
    table
        .find_all("td")
        .into_iter()
        .filter(|cell| cell.attr("data-fare-type") == Some(fare_class))
        .filter(|cell| cell.contains_class("span", "currency"))
        .filter(|cell| !cell.contains_class("span", "fares-remaining"))
        .filter_map(|cell| {
            let text: String = cell.text().split_whitespace().collect();
            let amount = text.trim_start_matches('$');
            match Fare::parse(amount) {
                Ok(fare) => Some(fare),
                Err(e) => {
                    trace!(error = %e, "skipping unpriced fare cell");
                    None
                }
            }
        })
        .min()
}

/// Find a fare table by id and return its lowest eligible fare.
pub fn lowest_fare_in_table(
    document: &str,
    table_id: &str,
    fare_class: &str,
) -> Result<Option<Fare>, WindowError> {
    let table = html::find_by_attr(document, "table", "id", table_id)
        .ok_or_else(|| WindowError::MissingTable(table_id.to_string()))?;
    Ok(lowest_fare(&table, fare_class))
}

/// Lowest outbound and return fares of a return-trip search page.
pub fn trip_fares(document: &str, fare_class: &str) -> Result<TripFares, WindowError> {
    Ok(TripFares {
        outbound: lowest_fare_in_table(document, OUTBOUND_TABLE_ID, fare_class)?,
        inbound: lowest_fare_in_table(document, RETURN_TABLE_ID, fare_class)?,
    })
}
