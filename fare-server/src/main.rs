use std::net::SocketAddr;

use chrono::FixedOffset;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fare_server::cache::{CacheConfig, CachedFareClient};
use fare_server::remote::{FareClient, FareClientConfig, MockFareClient};
use fare_server::stitch::StitchConfig;
use fare_server::web::{AppState, FareBackend, create_router};

fn env_flag(name: &str) -> bool {
    std::env::var(name).is_ok_and(|v| matches!(v.as_str(), "1" | "true" | "yes"))
}

fn client_config() -> FareClientConfig {
    let mut config = FareClientConfig::new();
    if let Ok(url) = std::env::var("FARE_BASE_URL") {
        config = config.with_base_url(url);
    }
    if let Ok(currency) = std::env::var("FARE_CURRENCY") {
        config = config.with_currency(currency);
    }
    if let Ok(secs) = std::env::var("FARE_TIMEOUT_SECS") {
        match secs.parse() {
            Ok(secs) => config = config.with_timeout(secs),
            Err(_) => warn!(value = %secs, "ignoring invalid FARE_TIMEOUT_SECS"),
        }
    }
    config
}

fn stitch_config() -> StitchConfig {
    let config = StitchConfig::default();
    let Ok(minutes) = std::env::var("FARE_UTC_OFFSET_MINUTES") else {
        return config;
    };
    match minutes.parse::<i32>().ok().and_then(|m| FixedOffset::east_opt(m * 60)) {
        Some(offset) => config.with_remote_offset(offset),
        None => {
            warn!(value = %minutes, "ignoring invalid FARE_UTC_OFFSET_MINUTES");
            config
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fare_server=info")),
        )
        .init();

    let config = stitch_config();
    let backend = if env_flag("FARE_MOCK") {
        info!("serving synthetic fares (FARE_MOCK set)");
        FareBackend::Mock(MockFareClient::new(config.today()))
    } else {
        let client = FareClient::new(client_config())?;
        FareBackend::Live(CachedFareClient::new(client, &CacheConfig::default()))
    };

    let mut state = AppState::new(backend, config);
    if let Ok(dir) = std::env::var("FARE_CHART_DIR") {
        info!(dir = %dir, "saving trend charts");
        state = state.with_chart_dir(dir);
    }

    let static_dir = std::env::var("FARE_STATIC_DIR")
        .unwrap_or_else(|_| concat!(env!("CARGO_MANIFEST_DIR"), "/static").to_string());
    let app = create_router(state, &static_dir);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    info!("Fare calendar listening on http://{addr}");
    info!("  GET  /health            - Health check");
    info!("  GET  /api/fares/trip    - Lowest fares for one trip");
    info!("  GET  /api/fares/period  - Lowest fare per day over a period");
    info!("  GET  /fares/trend       - Fare trend chart");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
