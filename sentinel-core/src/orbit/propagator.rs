//! Orbit propagator: element sets in, sub-satellite points out

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::catalog::CatalogEntry;
use super::error::{BackendUnavailable, OrbitError, PropagationError, SatelliteError};
use super::frames::{self, StateVector};
use super::tle::OrbitalElementSet;

/// Below this geocentric radius the satellite has decayed (WGS-72 equator)
const EARTH_RADIUS_KM: f64 = 6378.135;

/// Produces an inertial (TEME) state for an element set at an instant
pub trait PropagationBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn state_at(
        &self,
        elements: &OrbitalElementSet,
        instant: &DateTime<Utc>,
    ) -> Result<StateVector, PropagationError>;
}

/// SGP4 for near-earth orbits and SDP4 from a 225 minute period up,
/// both from the `sgp4` crate
#[cfg(feature = "sgp4")]
#[derive(Debug, Clone, Copy, Default)]
pub struct Sgp4Backend;

#[cfg(feature = "sgp4")]
impl PropagationBackend for Sgp4Backend {
    fn name(&self) -> &'static str {
        "sgp4"
    }

    fn state_at(
        &self,
        elements: &OrbitalElementSet,
        instant: &DateTime<Utc>,
    ) -> Result<StateVector, PropagationError> {
        let constants = sgp4::Constants::from_elements(elements.elements())
            .map_err(|e| PropagationError::Initialization(e.to_string()))?;
        let minutes = minutes_since_epoch(&elements.epoch(), instant)?;
        let prediction = constants
            .propagate(sgp4::MinutesSinceEpoch(minutes))
            .map_err(|e| PropagationError::Divergence(e.to_string()))?;

        Ok(StateVector {
            position: prediction.position,
            velocity: prediction.velocity,
        })
    }
}

#[cfg(feature = "sgp4")]
fn minutes_since_epoch(
    epoch: &DateTime<Utc>,
    instant: &DateTime<Utc>,
) -> Result<f64, PropagationError> {
    instant
        .signed_duration_since(*epoch)
        .num_microseconds()
        .map(|us| us as f64 / 60e6)
        .ok_or(PropagationError::TimeRange)
}

/// Geographic position of one satellite at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropagationResult {
    pub timestamp: DateTime<Utc>,
    /// Geodetic latitude, degrees
    pub latitude: f64,
    /// Degrees east, [-180, 180)
    pub longitude: f64,
    /// Above the WGS-84 ellipsoid, km
    pub altitude: f64,
    /// Inertial speed, km/s
    pub velocity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatellitePosition {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub velocity: f64,
    pub timestamp: DateTime<Utc>,
}

impl SatellitePosition {
    fn new(entry: &CatalogEntry, result: PropagationResult) -> Self {
        Self {
            id: entry.id(),
            name: entry.name.clone(),
            latitude: result.latitude,
            longitude: result.longitude,
            altitude: result.altitude,
            velocity: result.velocity,
            timestamp: result.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SatelliteFailure {
    pub id: String,
    pub name: String,
    #[serde(serialize_with = "serialize_display")]
    pub reason: SatelliteError,
}

fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: fmt::Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

/// Positions of a batch of satellites at a single instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub results: Vec<SatellitePosition>,
    pub errors: Vec<SatelliteFailure>,
}

/// Computes sub-satellite points. Cheap to clone; holds no mutable state.
#[derive(Clone)]
pub struct OrbitPropagator {
    backend: Option<Arc<dyn PropagationBackend>>,
}

impl Default for OrbitPropagator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OrbitPropagator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrbitPropagator")
            .field("backend", &self.backend_name())
            .finish()
    }
}

impl OrbitPropagator {
    /// Propagator backed by the built-in model when compiled in
    pub fn new() -> Self {
        #[cfg(feature = "sgp4")]
        {
            Self::with_backend(Arc::new(Sgp4Backend))
        }
        #[cfg(not(feature = "sgp4"))]
        {
            Self::unavailable()
        }
    }

    pub fn with_backend(backend: Arc<dyn PropagationBackend>) -> Self {
        Self { backend: Some(backend) }
    }

    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn backend_name(&self) -> Option<&'static str> {
        self.backend.as_ref().map(|b| b.name())
    }

    fn backend(&self) -> Result<&dyn PropagationBackend, BackendUnavailable> {
        self.backend.as_deref().ok_or(BackendUnavailable)
    }

    /// Sub-satellite point of one element set at `instant`
    pub fn propagate(
        &self,
        elements: &OrbitalElementSet,
        instant: DateTime<Utc>,
    ) -> Result<PropagationResult, OrbitError> {
        let backend = self.backend()?;
        Ok(locate(backend, elements, instant)?)
    }

    /// Propagate every entry to `instant` (now when `None`).
    ///
    /// Per-satellite failures land in `errors`; only a missing backend fails
    /// the whole call.
    pub fn snapshot(
        &self,
        entries: &[CatalogEntry],
        instant: Option<DateTime<Utc>>,
    ) -> Result<Snapshot, BackendUnavailable> {
        let backend = self.backend()?;
        let timestamp = instant.unwrap_or_else(Utc::now);

        let mut results = Vec::with_capacity(entries.len());
        let mut errors = Vec::new();

        for entry in entries {
            let outcome = OrbitalElementSet::from_entry(entry)
                .map_err(SatelliteError::from)
                .and_then(|elements| locate(backend, &elements, timestamp));

            match outcome {
                Ok(result) => {
                    debug!(
                        "{}: lat {:.4}, lon {:.4}, alt {:.1} km",
                        entry.id(),
                        result.latitude,
                        result.longitude,
                        result.altitude
                    );
                    results.push(SatellitePosition::new(entry, result));
                }
                Err(reason) => {
                    warn!("Skipping satellite {}: {}", entry.id(), reason);
                    errors.push(SatelliteFailure {
                        id: entry.id(),
                        name: entry.name.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            "Snapshot at {}: {} positioned, {} failed",
            timestamp.to_rfc3339(),
            results.len(),
            errors.len()
        );

        Ok(Snapshot { timestamp, results, errors })
    }
}

fn locate(
    backend: &dyn PropagationBackend,
    elements: &OrbitalElementSet,
    instant: DateTime<Utc>,
) -> Result<PropagationResult, SatelliteError> {
    let state = backend.state_at(elements, &instant)?;
    if !state.is_finite() {
        return Err(PropagationError::NonFinite.into());
    }
    let radius_km = frames::norm(&state.position);
    if radius_km < EARTH_RADIUS_KM {
        return Err(PropagationError::Decayed { radius_km }.into());
    }

    let gmst = frames::gmst(frames::julian_date(&instant));
    let geodetic = frames::ecef_to_geodetic(&frames::teme_to_ecef(&state.position, gmst));

    Ok(PropagationResult {
        timestamp: instant,
        latitude: geodetic.latitude_deg,
        longitude: geodetic.longitude_deg,
        altitude: geodetic.altitude_km,
        velocity: state.speed(),
    })
}
