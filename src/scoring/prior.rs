//! Outcrop sampling-bias prior.
//!
//! Traces are digitized on an outcrop surface, so planes that strike across
//! the outcrop face are sampled far more often than planes parallel to it.
//! The prior `sin(γ)/2π`, with `γ` the angle between the candidate normal and
//! the (downward) mean outcrop normal, compensates for that bias and
//! integrates to one over the orientation sphere.

use crate::angle::direction_from_trend_plunge;
use nalgebra::Vector3;
use std::f64::consts::TAU;

/// Prior density of the plane normal `(trend, plunge)` given the mean
/// sampled outcrop normal.
pub fn bias_prior(trend: f64, plunge: f64, outcrop_normal: &Vector3<f64>) -> f64 {
    let n = if outcrop_normal.z > 0.0 {
        -outcrop_normal
    } else {
        *outcrop_normal
    };
    let candidate = direction_from_trend_plunge(trend, plunge);
    let gamma = n.dot(&candidate).clamp(-1.0, 1.0).acos();
    gamma.sin() / TAU
}

/// Natural log of [`bias_prior`]; `-∞` when the candidate is parallel to the
/// outcrop normal.
pub fn log_bias_prior(trend: f64, plunge: f64, outcrop_normal: &Vector3<f64>) -> f64 {
    bias_prior(trend, plunge, outcrop_normal).ln()
}
