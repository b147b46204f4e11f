//! Access to the airline's fare search.
//!
//! Key characteristics of the booking site:
//! - Every search needs a session: cookies plus a `__RequestVerificationToken`
//!   scraped from the search page
//! - Results are HTML, never JSON
//! - A search only ever returns one short calendar window around the
//!   departure anchor

mod client;
mod error;
mod mock;
mod source;

pub use client::{FareClient, FareClientConfig, extract_token, form_fields};
pub use error::RemoteError;
pub use mock::{MockFareClient, RawDates};
pub use source::{FareSource, SearchForm, Session};
