//! Fare amounts.

use std::fmt;

/// Error returned when a fare string holds no usable amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid fare '{text}': {reason}")]
pub struct InvalidFare {
    text: String,
    reason: &'static str,
}

/// An exact fare amount in minor currency units (cents).
///
/// The remote service renders fares as currency-tagged strings
/// ("AUD 95.50", "$95.5", "$ 1,095"). Keeping them as integer cents makes
/// "lowest fare" an exact numeric comparison.
///
/// # Examples
///
/// ```
/// use fare_server::domain::Fare;
///
/// let fare = Fare::parse("AUD 95.50").unwrap();
/// assert_eq!(fare.minor_units(), 9550);
/// assert_eq!(fare.to_string(), "95.50");
///
/// assert_eq!(Fare::parse("$95.5").unwrap(), fare);
/// assert!(Fare::parse("Sold out").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fare(u64);

impl Fare {
    /// Create a fare from a whole number of cents.
    pub fn from_minor_units(cents: u64) -> Self {
        Self(cents)
    }

    /// Parse a rendered fare.
    ///
    /// Currency codes, symbols, whitespace and thousands separators are
    /// ignored. At most two decimal places are accepted.
    pub fn parse(text: &str) -> Result<Self, InvalidFare> {
        let invalid = |reason| InvalidFare {
            text: text.trim().to_string(),
            reason,
        };

        let numeric: String = text
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let numeric = numeric.trim_end_matches('.');

        if numeric.is_empty() {
            return Err(invalid("no digits"));
        }

        let (whole, frac) = match numeric.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (numeric, ""),
        };

        if frac.contains('.') {
            return Err(invalid("more than one decimal point"));
        }
        if frac.len() > 2 {
            return Err(invalid("more than two decimal places"));
        }

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount out of range"))?
        };
        let frac: u64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<u64>().map_err(|_| invalid("bad cents"))? * 10,
            _ => frac.parse().map_err(|_| invalid("bad cents"))?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .map(Self)
            .ok_or_else(|| invalid("amount out of range"))
    }

    /// The amount in cents.
    pub fn minor_units(&self) -> u64 {
        self.0
    }

    /// The amount as a floating point number of currency units (for charts).
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl fmt::Debug for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fare({self})")
    }
}

/// Passenger counts submitted with every search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Passengers {
    pub adults: u8,
    pub children: u8,
}

impl Passengers {
    pub fn new(adults: u8, children: u8) -> Self {
        Self { adults, children }
    }
}

impl Default for Passengers {
    fn default() -> Self {
        Self {
            adults: 1,
            children: 0,
        }
    }
}
