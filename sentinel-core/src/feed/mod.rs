//! Space-weather event feed
//!
//! Fetches solar flare, coronal mass ejection and geomagnetic storm records
//! from the NASA DONKI service for a look-back window of N days. Records are
//! passed through untouched; a failing category degrades to an empty list
//! with a typed error instead of failing the whole feed.

pub mod client;
pub mod types;

pub use client::{
    DEFAULT_DAYS_BACK, DEMO_API_KEY, DONKI_BASE_URL, EventFeedClient, FeedConfig, FeedTransport,
    HttpTransport,
};
pub use types::{
    CategoryReport, DateWindow, EventCategory, EventFeed, EventRecord, FeedError, FeedStatus,
    MAX_DAYS_BACK,
};
