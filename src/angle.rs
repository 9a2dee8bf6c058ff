//! Angle utilities used across the estimation pipeline.
//!
//! Orientations follow the structural-geology convention: trend is the
//! bearing measured clockwise from +Y (north) towards +X (east), plunge is the
//! angle below the horizontal, positive downwards.

use nalgebra::Vector3;
use std::f64::consts::{PI, TAU};

/// Wraps an angle into the range [0, 2π).
#[inline]
pub fn wrap_two_pi(angle: f64) -> f64 {
    let norm = angle.rem_euclid(TAU);
    if norm >= TAU {
        0.0
    } else {
        norm
    }
}

/// Wraps an angle into the range [0, π).
#[inline]
pub fn wrap_pi(angle: f64) -> f64 {
    let norm = angle.rem_euclid(PI);
    if norm >= PI {
        0.0
    } else {
        norm
    }
}

/// Trend and plunge (radians) of a direction, with the plunge forced into
/// [0, π/2] by reversing upward-pointing vectors.
#[inline]
pub fn trend_plunge(v: &Vector3<f64>) -> (f64, f64) {
    let trend = v.x.atan2(v.y);
    let plunge = -v.z.clamp(-1.0, 1.0).asin();
    if plunge < 0.0 {
        (wrap_two_pi(trend + PI), -plunge)
    } else {
        (wrap_two_pi(trend), plunge)
    }
}

/// Unit vector for a trend/plunge pair. The inverse of [`trend_plunge`] for
/// downward-pointing vectors.
#[inline]
pub fn direction_from_trend_plunge(trend: f64, plunge: f64) -> Vector3<f64> {
    Vector3::new(
        trend.sin() * plunge.cos(),
        trend.cos() * plunge.cos(),
        -plunge.sin(),
    )
}

/// Downward pole of a plane given its dip direction and dip (radians).
#[inline]
pub fn pole_from_dip(dip_direction: f64, dip: f64) -> Vector3<f64> {
    direction_from_trend_plunge(dip_direction + PI, std::f64::consts::FRAC_PI_2 - dip)
}

/// Unsigned angle between two 3D vectors in radians, in [0, π].
#[inline]
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let na = a.norm().max(1e-12);
    let nb = b.norm().max(1e-12);
    (a.dot(b) / (na * nb)).clamp(-1.0, 1.0).acos()
}

/// Angle between two lines (antipodal directions are equivalent), in [0, π/2].
#[inline]
pub fn angle_between_dirless(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let na = a.norm().max(1e-12);
    let nb = b.norm().max(1e-12);
    (a.dot(b) / (na * nb)).abs().clamp(0.0, 1.0).acos()
}
