//! JSON API over the event feed and the orbit propagator

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sentinel_core::feed::{DEFAULT_DAYS_BACK, EventCategory, EventFeedClient, MAX_DAYS_BACK};
use sentinel_core::orbit::{CatalogEntry, OrbitPropagator};

/// Shared, read-only request state
#[derive(Clone)]
pub struct AppState {
    pub feed: EventFeedClient,
    pub propagator: OrbitPropagator,
    pub catalog: Arc<Vec<CatalogEntry>>,
    pub api_key_configured: bool,
    pub default_days: u32,
}

impl AppState {
    pub fn new(
        feed: EventFeedClient,
        propagator: OrbitPropagator,
        catalog: Vec<CatalogEntry>,
    ) -> Self {
        Self {
            feed,
            propagator,
            catalog: Arc::new(catalog),
            api_key_configured: false,
            default_days: DEFAULT_DAYS_BACK,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DaysQuery {
    /// Kept as text so that junk falls back to the default instead of a 400
    days: Option<String>,
}

impl DaysQuery {
    /// Requested look-back, capped at [`MAX_DAYS_BACK`]
    fn days_or(&self, default: u32) -> u32 {
        self.days
            .as_deref()
            .and_then(|d| d.trim().parse::<u32>().ok())
            .unwrap_or(default)
            .min(MAX_DAYS_BACK)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SnapshotQuery {
    at: Option<String>,
}

pub fn router(state: AppState, enable_cors: bool) -> Router {
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/status", get(status))
        .route("/api/events", get(events))
        .route("/api/solar-flares", get(solar_flares))
        .route("/api/cme", get(cme_events))
        .route("/api/geomagnetic", get(geomagnetic_storms))
        .route("/api/satellites", get(satellites))
        .with_state(Arc::new(state));

    let app = if enable_cors {
        app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http())
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn status(State(state): State<Arc<AppState>>) -> Response {
    Json(json!({
        "status": "online",
        "service": "sentinel-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "api_key_configured": state.api_key_configured,
        "propagation_available": state.propagator.is_available(),
        "satellites_tracked": state.catalog.len(),
        "timestamp": Utc::now(),
    }))
    .into_response()
}

async fn events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DaysQuery>,
) -> Response {
    let days = query.days_or(state.default_days);
    let feed = state.feed.fetch_all_days(days).await;
    Json(feed).into_response()
}

async fn solar_flares(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DaysQuery>,
) -> Response {
    category_records(&state, EventCategory::SolarFlare, &query).await
}

async fn cme_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DaysQuery>,
) -> Response {
    category_records(&state, EventCategory::CoronalMassEjection, &query).await
}

async fn geomagnetic_storms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DaysQuery>,
) -> Response {
    category_records(&state, EventCategory::GeomagneticStorm, &query).await
}

/// Bare record array; upstream failures show up as an empty array
async fn category_records(
    state: &AppState,
    category: EventCategory,
    query: &DaysQuery,
) -> Response {
    let window = state.feed.resolve_window(query.days_or(state.default_days));
    let report = state.feed.fetch_category(category, &window).await;
    Json(report.records).into_response()
}

async fn satellites(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SnapshotQuery>,
) -> Response {
    if !state.propagator.is_available() {
        return unavailable();
    }

    let instant = match query.at.as_deref().map(DateTime::parse_from_rfc3339) {
        None => None,
        Some(Ok(at)) => Some(at.with_timezone(&Utc)),
        Some(Err(e)) => {
            tracing::debug!("Rejecting snapshot time {:?}: {}", query.at, e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("invalid 'at' timestamp: {}", e) })),
            )
                .into_response();
        }
    };

    match state.propagator.snapshot(&state.catalog, instant) {
        Ok(snapshot) => Json(json!({
            "count": snapshot.results.len(),
            "satellites": snapshot.results,
            "timestamp": snapshot.timestamp,
            "errors": snapshot.errors,
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Snapshot failed: {}", e);
            unavailable()
        }
    }
}

fn unavailable() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "error": "Satellite tracking unavailable",
            "message": "orbit propagation backend not available",
        })),
    )
        .into_response()
}
