//! Orbit error types

use super::tle::ElementParseError;

/// The model could not produce a usable state for this satellite
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropagationError {
    /// Element set rejected while deriving the model constants
    #[error("model initialization failed: {0}")]
    Initialization(String),

    /// Eccentricity or semi-latus rectum left its valid range mid-flight
    #[error("model diverged: {0}")]
    Divergence(String),

    #[error("satellite has decayed (radius {radius_km:.1} km)")]
    Decayed { radius_km: f64 },

    #[error("propagation produced non-finite values")]
    NonFinite,

    #[error("requested time is out of range")]
    TimeRange,
}

/// Per-satellite failure: bad element set or a model breakdown
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SatelliteError {
    #[error("invalid element set: {0}")]
    Parse(#[from] ElementParseError),

    #[error("propagation failed: {0}")]
    Propagation(#[from] PropagationError),
}

/// No propagation backend is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("orbit propagation backend not available")]
pub struct BackendUnavailable;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrbitError {
    #[error(transparent)]
    Unavailable(#[from] BackendUnavailable),

    #[error(transparent)]
    Satellite(#[from] SatelliteError),
}

impl From<ElementParseError> for OrbitError {
    fn from(err: ElementParseError) -> Self {
        OrbitError::Satellite(err.into())
    }
}

impl From<PropagationError> for OrbitError {
    fn from(err: PropagationError) -> Self {
        OrbitError::Satellite(err.into())
    }
}
