//! Event feed data types

use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single upstream record. The feed never looks inside it.
pub type EventRecord = serde_json::Value;

/// The three DONKI categories served by the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    SolarFlare,
    CoronalMassEjection,
    GeomagneticStorm,
}

impl EventCategory {
    pub const ALL: [EventCategory; 3] = [
        EventCategory::SolarFlare,
        EventCategory::CoronalMassEjection,
        EventCategory::GeomagneticStorm,
    ];

    /// DONKI endpoint name, e.g. `FLR`
    pub fn endpoint(&self) -> &'static str {
        match self {
            EventCategory::SolarFlare => "FLR",
            EventCategory::CoronalMassEjection => "CME",
            EventCategory::GeomagneticStorm => "GST",
        }
    }

    /// Key used for this category in the aggregated JSON payload
    pub fn response_key(&self) -> &'static str {
        match self {
            EventCategory::SolarFlare => "solar_flares",
            EventCategory::CoronalMassEjection => "cme_events",
            EventCategory::GeomagneticStorm => "geomagnetic_storms",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EventCategory::SolarFlare => "solar flares",
            EventCategory::CoronalMassEjection => "coronal mass ejections",
            EventCategory::GeomagneticStorm => "geomagnetic storms",
        };
        f.write_str(label)
    }
}

/// Longest look-back the HTTP layer passes through, roughly a century
pub const MAX_DAYS_BACK: u32 = 36_525;

/// Inclusive calendar-date window sent to the upstream as `startDate`/`endDate`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window ending today (UTC) and starting `days_back` days earlier.
    pub fn resolve(days_back: u32) -> Self {
        Self::ending_on(Utc::now().date_naive(), days_back)
    }

    /// Window ending on `end` and starting `days_back` days earlier.
    ///
    /// The span is exact as long as the start stays within chrono's date
    /// range, which holds for anything up to [`MAX_DAYS_BACK`]. Past that
    /// the start saturates at the earliest representable date.
    pub fn ending_on(end: NaiveDate, days_back: u32) -> Self {
        let start = end
            .checked_sub_days(Days::new(u64::from(days_back)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end }
    }

    /// Number of days between start and end
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start_param(), self.end_param())
    }
}

/// Upstream failure for one category fetch
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeedError {
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("request to {endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("HTTP error {status} from {endpoint}")]
    Status { endpoint: String, status: u16 },

    #[error("failed to decode {endpoint} response: {message}")]
    Decode { endpoint: String, message: String },
}

/// Outcome of fetching one category
#[derive(Debug, Clone)]
pub struct CategoryReport {
    pub category: EventCategory,
    /// Empty whenever `error` is set
    pub records: Vec<EventRecord>,
    pub error: Option<FeedError>,
}

impl CategoryReport {
    pub fn success(category: EventCategory, records: Vec<EventRecord>) -> Self {
        Self { category, records, error: None }
    }

    pub fn failure(category: EventCategory, error: FeedError) -> Self {
        Self { category, records: Vec::new(), error: Some(error) }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Overall health of an aggregated fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedStatus {
    /// Every category fetched
    Complete,
    /// Some categories failed
    Partial,
    /// No category could be fetched
    Failed,
}

/// All three categories for one window
#[derive(Debug, Clone)]
pub struct EventFeed {
    pub window: DateWindow,
    pub solar_flares: CategoryReport,
    pub cme_events: CategoryReport,
    pub geomagnetic_storms: CategoryReport,
}

impl EventFeed {
    pub fn reports(&self) -> [&CategoryReport; 3] {
        [&self.solar_flares, &self.cme_events, &self.geomagnetic_storms]
    }

    pub fn category(&self, category: EventCategory) -> &CategoryReport {
        match category {
            EventCategory::SolarFlare => &self.solar_flares,
            EventCategory::CoronalMassEjection => &self.cme_events,
            EventCategory::GeomagneticStorm => &self.geomagnetic_storms,
        }
    }

    pub fn status(&self) -> FeedStatus {
        let failed = self.reports().iter().filter(|r| !r.is_ok()).count();
        match failed {
            0 => FeedStatus::Complete,
            n if n == EventCategory::ALL.len() => FeedStatus::Failed,
            _ => FeedStatus::Partial,
        }
    }

    /// Error message per failed category, keyed like the payload
    pub fn errors(&self) -> BTreeMap<&'static str, String> {
        self.reports()
            .iter()
            .filter_map(|r| {
                r.error
                    .as_ref()
                    .map(|e| (r.category.response_key(), e.to_string()))
            })
            .collect()
    }

    pub fn total_records(&self) -> usize {
        self.reports().iter().map(|r| r.records.len()).sum()
    }
}

#[derive(Serialize)]
struct EventFeedPayload<'a> {
    window: &'a DateWindow,
    status: FeedStatus,
    solar_flares: &'a [EventRecord],
    cme_events: &'a [EventRecord],
    geomagnetic_storms: &'a [EventRecord],
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    errors: BTreeMap<&'static str, String>,
}

impl Serialize for EventFeed {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EventFeedPayload {
            window: &self.window,
            status: self.status(),
            solar_flares: &self.solar_flares.records,
            cme_events: &self.cme_events.records,
            geomagnetic_storms: &self.geomagnetic_storms.records,
            errors: self.errors(),
        }
        .serialize(serializer)
    }
}
