//! Application state for the web layer.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::CachedFareClient;
use crate::remote::{FareClient, FareSource, MockFareClient, RemoteError, SearchForm, Session};
use crate::stitch::StitchConfig;

/// Where the server gets its search pages from.
pub enum FareBackend {
    /// The booking site, behind the page cache.
    Live(CachedFareClient<FareClient>),
    /// Synthetic pages, for running without network access.
    Mock(MockFareClient),
}

impl FareSource for FareBackend {
    async fn open_session(&self) -> Result<Session, RemoteError> {
        match self {
            FareBackend::Live(client) => client.open_session().await,
            FareBackend::Mock(mock) => mock.open_session().await,
        }
    }

    async fn search(&self, session: &Session, form: &SearchForm) -> Result<String, RemoteError> {
        match self {
            FareBackend::Live(client) => client.search(session, form).await,
            FareBackend::Mock(mock) => mock.search(session, form).await,
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Source of fare search pages
    pub fares: Arc<FareBackend>,

    /// Stitching configuration
    pub config: Arc<StitchConfig>,

    /// Directory each rendered trend chart is also saved to
    pub chart_dir: Option<Arc<PathBuf>>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(fares: FareBackend, config: StitchConfig) -> Self {
        Self {
            fares: Arc::new(fares),
            config: Arc::new(config),
            chart_dir: None,
        }
    }

    /// Save every rendered trend chart under `dir`.
    pub fn with_chart_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.chart_dir = Some(Arc::new(dir.into()));
        self
    }
}
