//! Airport code types.

use std::fmt;

/// Error returned when parsing an invalid airport code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid airport code: {reason}")]
pub struct InvalidAirportCode {
    reason: &'static str,
}

/// A valid 3-letter IATA airport code.
///
/// The fare search form takes origin and destination as IATA codes
/// ("MEL", "SYD"). This type guarantees that any `AirportCode` value is
/// three uppercase ASCII letters.
///
/// # Examples
///
/// ```
/// use fare_server::domain::AirportCode;
///
/// let mel = AirportCode::parse("MEL").unwrap();
/// assert_eq!(mel.as_str(), "MEL");
///
/// // Lowercase is rejected by `parse` but accepted by `parse_normalized`
/// assert!(AirportCode::parse("mel").is_err());
/// assert_eq!(AirportCode::parse_normalized(" mel ").unwrap(), mel);
///
/// // Wrong length is rejected
/// assert!(AirportCode::parse("ME").is_err());
/// assert!(AirportCode::parse("MELB").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AirportCode([u8; 3]);

impl AirportCode {
    /// Parse an airport code from a string.
    ///
    /// The input must be exactly 3 uppercase ASCII letters (A-Z).
    pub fn parse(s: &str) -> Result<Self, InvalidAirportCode> {
        let bytes = s.as_bytes();

        if bytes.len() != 3 {
            return Err(InvalidAirportCode {
                reason: "must be exactly 3 characters",
            });
        }

        for &b in bytes {
            if !b.is_ascii_uppercase() {
                return Err(InvalidAirportCode {
                    reason: "must be uppercase ASCII letters A-Z",
                });
            }
        }

        Ok(AirportCode([bytes[0], bytes[1], bytes[2]]))
    }

    /// Parse user input: surrounding whitespace is trimmed and letters are
    /// uppercased before validation.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidAirportCode> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII uppercase letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl fmt::Debug for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AirportCode({})", self.as_str())
    }
}

impl fmt::Display for AirportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An origin/destination pair for a return trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Route {
    pub origin: AirportCode,
    pub destination: AirportCode,
}

impl Route {
    /// Create a new route.
    pub fn new(origin: AirportCode, destination: AirportCode) -> Self {
        Self {
            origin,
            destination,
        }
    }

    /// The same route flown the other way.
    pub fn reversed(&self) -> Self {
        Self {
            origin: self.destination,
            destination: self.origin,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.origin, self.destination)
    }
}
