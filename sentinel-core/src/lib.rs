//! Core of the SENTINEL space-weather service.
//!
//! - [`feed`]: NASA DONKI event feed client (solar flares, CMEs, geomagnetic storms)
//! - [`orbit`]: two-line element parsing and SGP4 satellite snapshots
//!
//! Nothing in here knows about HTTP routing or configuration files; the
//! backend crate builds these components from its config and exposes them.

pub mod feed;
pub mod orbit;

pub use feed::{EventCategory, EventFeed, EventFeedClient, FeedConfig};
pub use orbit::{OrbitPropagator, Snapshot};
