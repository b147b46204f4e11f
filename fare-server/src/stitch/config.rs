//! Stitcher configuration.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

use crate::calendar::DEFAULT_FARE_CLASS;

/// UTC offset of the booking site's calendar (AEST).
pub const DEFAULT_REMOTE_OFFSET_SECS: i32 = 10 * 3600;

/// Configuration parameters for window stitching.
#[derive(Debug, Clone)]
pub struct StitchConfig {
    /// Maximum number of search pages fetched for one query.
    /// The query fails with `FetchLimit` rather than fetching more.
    pub max_fetches: usize,

    /// Fare class whose prices count for heading fares.
    pub fare_class: String,

    /// Offset of the booking site's clock. "Today" is the remote's
    /// calendar day, which can differ from the server's.
    pub remote_offset: FixedOffset,
}

impl StitchConfig {
    pub fn new(max_fetches: usize, fare_class: impl Into<String>) -> Self {
        Self {
            max_fetches,
            fare_class: fare_class.into(),
            remote_offset: default_offset(),
        }
    }

    pub fn with_max_fetches(mut self, n: usize) -> Self {
        self.max_fetches = n;
        self
    }

    pub fn with_fare_class(mut self, fare_class: impl Into<String>) -> Self {
        self.fare_class = fare_class.into();
        self
    }

    pub fn with_remote_offset(mut self, offset: FixedOffset) -> Self {
        self.remote_offset = offset;
        self
    }

    /// The remote's calendar day right now.
    pub fn today(&self) -> NaiveDate {
        self.today_at(Utc::now())
    }

    /// The remote's calendar day at instant `now`.
    pub fn today_at(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.remote_offset).date_naive()
    }
}

fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_REMOTE_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            max_fetches: 64,
            fare_class: DEFAULT_FARE_CLASS.to_string(),
            remote_offset: default_offset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StitchConfig::default();
        assert_eq!(config.max_fetches, 64);
        assert_eq!(config.fare_class, "Light Fare");
    }

    #[test]
    fn builder() {
        let config = StitchConfig::default()
            .with_max_fetches(3)
            .with_fare_class("Flex Fare");
        assert_eq!(config.max_fetches, 3);
        assert_eq!(config.fare_class, "Flex Fare");

        let config = StitchConfig::new(5, "Light Fare");
        assert_eq!(config.max_fetches, 5);
    }

    #[test]
    fn today_follows_the_remote_clock() {
        // 20:00 UTC on 31 March is already 1 April in Melbourne
        let now = NaiveDate::from_ymd_opt(2019, 3, 31)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap()
            .and_utc();

        let config = StitchConfig::default();
        assert_eq!(config.today_at(now), NaiveDate::from_ymd_opt(2019, 4, 1).unwrap());

        let utc = config.with_remote_offset(FixedOffset::east_opt(0).unwrap());
        assert_eq!(utc.today_at(now), NaiveDate::from_ymd_opt(2019, 3, 31).unwrap());

        let west = StitchConfig::default()
            .with_remote_offset(FixedOffset::west_opt(5 * 3600).unwrap());
        assert_eq!(west.today_at(now), NaiveDate::from_ymd_opt(2019, 3, 31).unwrap());
    }
}
