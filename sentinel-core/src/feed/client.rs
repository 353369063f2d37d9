//! DONKI client: one GET per category, concurrent, no retries, no caching.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::types::{CategoryReport, DateWindow, EventCategory, EventFeed, EventRecord, FeedError};

pub const DONKI_BASE_URL: &str = "https://api.nasa.gov/DONKI";
/// Rate-limited key NASA hands out for anonymous use
pub const DEMO_API_KEY: &str = "DEMO_KEY";
pub const DEFAULT_DAYS_BACK: u32 = 30;
const REQUEST_TIMEOUT_SECONDS: u64 = 30;
const USER_AGENT: &str = concat!("sentinel/", env!("CARGO_PKG_VERSION"));

/// Settings fixed at construction time
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub api_key: String,
    /// Per-request transport timeout
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DONKI_BASE_URL.to_string(),
            api_key: DEMO_API_KEY.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECONDS),
        }
    }
}

impl FeedConfig {
    pub fn api_key_configured(&self) -> bool {
        !self.api_key.is_empty() && self.api_key != DEMO_API_KEY
    }
}

/// Fetches the raw records of one category for one window
#[async_trait]
pub trait FeedTransport: Send + Sync {
    async fn fetch(
        &self,
        category: EventCategory,
        window: &DateWindow,
    ) -> Result<Vec<EventRecord>, FeedError>;
}

/// reqwest-backed transport against the DONKI REST API
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FeedError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn request_url(&self, category: EventCategory, window: &DateWindow) -> Result<Url, FeedError> {
        let start = window.start_param();
        let end = window.end_param();
        let base = format!("{}/{}", self.base_url, category.endpoint());

        Url::parse_with_params(
            &base,
            &[
                ("startDate", start.as_str()),
                ("endDate", end.as_str()),
                ("api_key", self.api_key.as_str()),
            ],
        )
        .map_err(|e| FeedError::Client(format!("invalid feed URL '{}': {}", base, e)))
    }
}

#[async_trait]
impl FeedTransport for HttpTransport {
    async fn fetch(
        &self,
        category: EventCategory,
        window: &DateWindow,
    ) -> Result<Vec<EventRecord>, FeedError> {
        let endpoint = category.endpoint();
        // The URL carries the API key, so only the endpoint name gets logged
        let url = self.request_url(category, window)?;
        debug!("GET {} for {}", endpoint, window);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(endpoint, e))?;

        decode_records(endpoint, &body)
    }
}

/// reqwest puts the request URL, API key included, into its error text;
/// it is stripped before the message is stored or logged.
fn transport_error(endpoint: &str, err: reqwest::Error) -> FeedError {
    if err.is_timeout() {
        FeedError::Timeout { endpoint: endpoint.to_string() }
    } else {
        FeedError::Transport {
            endpoint: endpoint.to_string(),
            message: err.without_url().to_string(),
        }
    }
}

/// Parse a DONKI response body.
///
/// DONKI answers an empty window with an empty body rather than `[]`.
pub(crate) fn decode_records(endpoint: &str, body: &str) -> Result<Vec<EventRecord>, FeedError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str::<Vec<EventRecord>>(body).map_err(|e| FeedError::Decode {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

/// Space-weather event client.
///
/// Holds only its transport; every call is a fresh upstream fetch.
#[derive(Clone)]
pub struct EventFeedClient {
    transport: Arc<dyn FeedTransport>,
}

impl EventFeedClient {
    pub fn new(config: &FeedConfig) -> Result<Self, FeedError> {
        let transport = HttpTransport::new(config)?;
        info!(
            "Event feed client targeting {} (api key configured: {})",
            config.base_url,
            config.api_key_configured()
        );
        Ok(Self::with_transport(Arc::new(transport)))
    }

    pub fn with_transport(transport: Arc<dyn FeedTransport>) -> Self {
        Self { transport }
    }

    pub fn resolve_window(&self, days_back: u32) -> DateWindow {
        DateWindow::resolve(days_back)
    }

    /// Fetch one category. Failures come back inside the report.
    pub async fn fetch_category(
        &self,
        category: EventCategory,
        window: &DateWindow,
    ) -> CategoryReport {
        self.fetch_category_within(category, window, None).await
    }

    /// Fetch all categories concurrently.
    pub async fn fetch_all(&self, window: &DateWindow) -> EventFeed {
        self.fetch_all_with_deadline(window, None).await
    }

    /// Fetch all categories, bounding each call by `deadline` on its own so a
    /// slow category cannot hold back the others.
    pub async fn fetch_all_with_deadline(
        &self,
        window: &DateWindow,
        deadline: Option<Duration>,
    ) -> EventFeed {
        let (solar_flares, cme_events, geomagnetic_storms) = tokio::join!(
            self.fetch_category_within(EventCategory::SolarFlare, window, deadline),
            self.fetch_category_within(EventCategory::CoronalMassEjection, window, deadline),
            self.fetch_category_within(EventCategory::GeomagneticStorm, window, deadline),
        );

        let feed = EventFeed {
            window: *window,
            solar_flares,
            cme_events,
            geomagnetic_storms,
        };

        info!(
            "Event feed {}: {} records, status {:?}",
            window,
            feed.total_records(),
            feed.status()
        );
        feed
    }

    /// Resolve a look-back window and fetch everything in it.
    pub async fn fetch_all_days(&self, days_back: u32) -> EventFeed {
        let window = self.resolve_window(days_back);
        self.fetch_all(&window).await
    }

    async fn fetch_category_within(
        &self,
        category: EventCategory,
        window: &DateWindow,
        deadline: Option<Duration>,
    ) -> CategoryReport {
        let fetch = self.transport.fetch(category, window);
        let result = match deadline {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .unwrap_or_else(|_| {
                    Err(FeedError::Timeout {
                        endpoint: category.endpoint().to_string(),
                    })
                }),
            None => fetch.await,
        };

        match result {
            Ok(records) => {
                debug!("Fetched {} {} for {}", records.len(), category, window);
                CategoryReport::success(category, records)
            }
            Err(e) => {
                warn!("Failed to fetch {} for {}: {}", category, window, e);
                CategoryReport::failure(category, e)
            }
        }
    }
}
