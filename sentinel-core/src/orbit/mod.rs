//! Satellite positions from two-line element sets
//!
//! Element sets are validated, propagated with SGP4/SDP4 from the `sgp4`
//! crate, rotated into the Earth-fixed frame and reduced to WGS-84 latitude,
//! longitude and altitude. The model is compiled in behind the `sgp4`
//! feature; without it the propagator reports itself unavailable.

pub mod catalog;
pub mod error;
pub mod frames;
pub mod propagator;
pub mod tle;

pub use catalog::{CatalogEntry, default_catalog, parse_catalog};
pub use error::{BackendUnavailable, OrbitError, PropagationError, SatelliteError};
pub use frames::{Geodetic, StateVector};
pub use propagator::{
    OrbitPropagator, PropagationBackend, PropagationResult, SatelliteFailure, SatellitePosition,
    Snapshot,
};
#[cfg(feature = "sgp4")]
pub use propagator::Sgp4Backend;
pub use tle::{ElementParseError, OrbitalElementSet};
