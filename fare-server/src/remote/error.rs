//! Fare service client error types.

/// Errors from talking to the fare service.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status
    #[error("fare service error {status}: {message}")]
    Api { status: u16, message: String },

    /// The search page carried no anti-forgery token
    #[error("search page has no request verification token")]
    MissingToken,

    /// The client could not be built from its configuration
    #[error("invalid client configuration: {0}")]
    Config(String),
}
