//! HTTP client for the airline's booking search form.
//!
//! A search is a two-step exchange: GET the search page to pick up session
//! cookies and the `__RequestVerificationToken`, then POST the form with
//! the token echoed back. Both responses are HTML.

use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::debug;

use crate::html;

use super::error::RemoteError;
use super::source::{FareSource, SearchForm, Session};

/// Default booking site.
const DEFAULT_BASE_URL: &str = "https://booking.tigerair.com.au";

/// Path of the search page (GET for the token, POST for results).
const DEFAULT_SEARCH_PATH: &str = "/TigerAirIBE/Booking/Search";

const DEFAULT_CURRENCY: &str = "AUD";

/// The site serves a reduced page to unknown agents.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_2) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/72.0.3626.121 Safari/537.36";

/// Name of the hidden anti-forgery input and form field.
const TOKEN_FIELD: &str = "__RequestVerificationToken";

/// Configuration for the fare client.
#[derive(Debug, Clone)]
pub struct FareClientConfig {
    /// Scheme and host of the booking site
    pub base_url: String,
    /// Path of the search page
    pub search_path: String,
    /// Currency code submitted with every search
    pub currency: String,
    /// User-Agent header
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FareClientConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_search_path(mut self, path: impl Into<String>) -> Self {
        self.search_path = path.into();
        self
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn search_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.search_path.trim_start_matches('/')
        )
    }
}

impl Default for FareClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Booking site client.
///
/// Cloning is cheap and clones share the cookie store, so a session opened
/// through one clone is valid for searches through another.
#[derive(Debug, Clone)]
pub struct FareClient {
    http: reqwest::Client,
    search_url: String,
    origin: HeaderValue,
    currency: String,
}

impl FareClient {
    /// Create a new client with the given configuration.
    pub fn new(config: FareClientConfig) -> Result<Self, RemoteError> {
        let origin = HeaderValue::from_str(config.base_url.trim_end_matches('/'))
            .map_err(|_| RemoteError::Config(format!("bad base URL '{}'", config.base_url)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            search_url: config.search_url(),
            origin,
            currency: config.currency,
        })
    }

    /// Currency code submitted with searches.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    async fn fetch_session(&self) -> Result<Session, RemoteError> {
        debug!(url = %self.search_url, "opening fare search session");

        let response = self.http.get(&self.search_url).send().await?;
        let body = success_body(response).await?;

        let token = extract_token(&body).ok_or(RemoteError::MissingToken)?;
        Ok(Session::new(token))
    }

    async fn post_search(&self, session: &Session, form: &SearchForm) -> Result<String, RemoteError> {
        debug!(
            route = %form.route,
            departure = %form.departure(),
            return_date = %form.return_date(),
            "submitting fare search"
        );

        let response = self
            .http
            .post(&self.search_url)
            .header(header::ORIGIN, self.origin.clone())
            .form(&form_fields(form, &self.currency, session.token()))
            .send()
            .await?;

        success_body(response).await
    }
}

impl FareSource for FareClient {
    async fn open_session(&self) -> Result<Session, RemoteError> {
        self.fetch_session().await
    }

    async fn search(&self, session: &Session, form: &SearchForm) -> Result<String, RemoteError> {
        self.post_search(session, form).await
    }
}

async fn success_body(response: reqwest::Response) -> Result<String, RemoteError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(RemoteError::Api {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        });
    }
    Ok(response.text().await?)
}

/// Read the anti-forgery token from a search page.
pub fn extract_token(page: &str) -> Option<String> {
    html::find_by_attr(page, "input", "name", TOKEN_FIELD)
        .and_then(|input| input.attr("value"))
        .map(html::decode_entities)
        .filter(|token| !token.is_empty())
}

/// The POST body for a return-trip search.
pub fn form_fields(form: &SearchForm, currency: &str, token: &str) -> Vec<(&'static str, String)> {
    vec![
        ("Adultcount", form.passengers.adults.to_string()),
        ("Childcount", form.passengers.children.to_string()),
        ("InfantCount", "0".to_string()),
        ("Origin", form.route.origin.to_string()),
        ("Destination", form.route.destination.to_string()),
        ("DepartureDate", form.departure().format("%Y-%m-%d").to_string()),
        ("ReturnDate", form.return_date().format("%Y-%m-%d").to_string()),
        ("SelectedCurrencyCode", currency.to_string()),
        ("TripKind", "return".to_string()),
        ("onoffswitch", "on".to_string()),
        (TOKEN_FIELD, token.to_string()),
    ]
}
