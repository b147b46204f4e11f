//! Fare calendar server.
//!
//! Answers "what is the lowest fare on each day of this period?" against
//! an airline booking site that only shows a short calendar window per
//! search, by stitching successive windows into one exact day series.

pub mod cache;
pub mod calendar;
pub mod chart;
pub mod domain;
pub mod html;
pub mod query;
pub mod remote;
pub mod stitch;
pub mod web;
