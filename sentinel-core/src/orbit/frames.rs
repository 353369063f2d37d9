//! Reference frames: TEME → Earth-fixed → WGS-84 geodetic
//!
//! SGP4 output lives in TEME (true equator, mean equinox). Rotating it by the
//! Greenwich mean sidereal time gives the pseudo Earth-fixed frame; polar
//! motion is ignored and UT1 is taken equal to UTC (sub-second error).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::f64::consts::TAU;

/// WGS-84 semi-major axis, km
pub const WGS84_A_KM: f64 = 6378.137;
/// WGS-84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

const JD_UNIX_EPOCH: f64 = 2_440_587.5;
const JD_J2000: f64 = 2_451_545.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

const GEODETIC_TOLERANCE_RAD: f64 = 1e-12;
const GEODETIC_MAX_ITERATIONS: usize = 20;

/// Position (km) and velocity (km/s)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position: [f64; 3],
    pub velocity: [f64; 3],
}

impl StateVector {
    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.velocity.iter()).all(|v| v.is_finite())
    }

    pub fn speed(&self) -> f64 {
        norm(&self.velocity)
    }
}

/// Geodetic coordinates on the WGS-84 ellipsoid
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Geodetic {
    /// Degrees, [-90, 90]
    pub latitude_deg: f64,
    /// Degrees east, [-180, 180)
    pub longitude_deg: f64,
    /// Height above the ellipsoid, km
    pub altitude_km: f64,
}

/// Julian date (UTC) of an instant
pub fn julian_date(instant: &DateTime<Utc>) -> f64 {
    let seconds = instant.timestamp() as f64 + f64::from(instant.timestamp_subsec_nanos()) * 1e-9;
    seconds / SECONDS_PER_DAY + JD_UNIX_EPOCH
}

/// Greenwich mean sidereal time (IAU 1982), radians in [0, 2π)
pub fn gmst(jd_ut1: f64) -> f64 {
    let t = (jd_ut1 - JD_J2000) / 36_525.0;
    // Seconds of time; 876600 h is the whole-revolution part of the linear term
    let seconds = -6.2e-6 * t * t * t
        + 0.093_104 * t * t
        + (876_600.0 * 3600.0 + 8_640_184.812_866) * t
        + 67_310.548_41;
    // 1 s of time = 1/240 degree
    (seconds / 240.0).to_radians().rem_euclid(TAU)
}

/// Rotate a TEME vector into the Earth-fixed frame
pub fn teme_to_ecef(position: &[f64; 3], gmst: f64) -> [f64; 3] {
    let (sin, cos) = gmst.sin_cos();
    [
        cos * position[0] + sin * position[1],
        -sin * position[0] + cos * position[1],
        position[2],
    ]
}

/// Earth-fixed Cartesian (km) to geodetic coordinates.
///
/// Fixed-point iteration on latitude; stays well defined on the polar axis
/// where the horizontal distance goes to zero.
pub fn ecef_to_geodetic(position: &[f64; 3]) -> Geodetic {
    let [x, y, z] = *position;
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let p = x.hypot(y);

    let mut latitude = z.atan2(p * (1.0 - e2));
    for _ in 0..GEODETIC_MAX_ITERATIONS {
        let sin_lat = latitude.sin();
        let n = WGS84_A_KM / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let next = (z + e2 * n * sin_lat).atan2(p);
        let converged = (next - latitude).abs() < GEODETIC_TOLERANCE_RAD;
        latitude = next;
        if converged {
            break;
        }
    }

    let (sin_lat, cos_lat) = latitude.sin_cos();
    let altitude = p * cos_lat + z * sin_lat - WGS84_A_KM * (1.0 - e2 * sin_lat * sin_lat).sqrt();

    Geodetic {
        latitude_deg: latitude.to_degrees(),
        longitude_deg: normalize_longitude(y.atan2(x).to_degrees()),
        altitude_km: altitude,
    }
}

/// Wrap degrees into [-180, 180)
pub fn normalize_longitude(degrees: f64) -> f64 {
    let wrapped = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid can round up to exactly 360
    if wrapped >= 180.0 { wrapped - 360.0 } else { wrapped }
}

pub fn norm(v: &[f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}
