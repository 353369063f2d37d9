use anyhow::{Context, Result};
use sentinel_backend::config::{self, SentinelConfig};
use sentinel_backend::logging;
use sentinel_backend::routes::{self, AppState};
use sentinel_core::feed::EventFeedClient;
use sentinel_core::orbit::OrbitPropagator;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = config::config_path();
    let config = SentinelConfig::load(&config_path)?;

    let _logging_guard =
        logging::init_logging(&config.log_dir, "sentinel-backend", &config.log_level)?;

    tracing::info!("SENTINEL backend starting...");
    tracing::info!("Configuration loaded from {}", config_path);

    let feed_config = config.feed_config();
    let feed = EventFeedClient::new(&feed_config).context("Failed to build event feed client")?;
    if !feed_config.api_key_configured() {
        tracing::warn!("No NASA API key configured, using the rate-limited demo key");
    }

    let propagator = OrbitPropagator::new();
    match propagator.backend_name() {
        Some(name) => tracing::info!("Orbit propagation backend: {}", name),
        None => tracing::warn!("Orbit propagation unavailable, /api/satellites will answer 503"),
    }

    let catalog = config.load_catalog()?;
    tracing::info!("Tracking {} satellites", catalog.len());

    let state = AppState {
        api_key_configured: feed_config.api_key_configured(),
        default_days: config.donki.default_days,
        ..AppState::new(feed, propagator, catalog)
    };
    let app = routes::router(state, config.server.enable_cors);

    let addr = config.server_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
