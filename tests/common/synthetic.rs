#![allow(dead_code)]

use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use structure_normals::angle::pole_from_dip;
use structure_normals::{Trace, TracePoint};

/// Orientation of a synthetic plane, in degrees.
#[derive(Clone, Copy, Debug)]
pub struct PlaneSpec {
    pub dip_direction_deg: f64,
    pub dip_deg: f64,
}

impl PlaneSpec {
    pub fn new(dip_direction_deg: f64, dip_deg: f64) -> Self {
        Self {
            dip_direction_deg,
            dip_deg,
        }
    }

    /// Downward unit pole of the plane.
    pub fn pole(&self) -> Vector3<f64> {
        pole_from_dip(self.dip_direction_deg.to_radians(), self.dip_deg.to_radians())
    }

    /// Horizontal strike direction and down-dip direction spanning the plane.
    pub fn basis(&self) -> (Vector3<f64>, Vector3<f64>) {
        let pole = self.pole();
        let strike = pole.cross(&Vector3::z()).normalize();
        let dip_line = pole.cross(&strike).normalize();
        (strike, dip_line)
    }

    /// Horizontal outcrop normal facing across the strike.
    pub fn outcrop_normal(&self) -> Vector3<f64> {
        let (_, dip_line) = self.basis();
        Vector3::new(dip_line.x, dip_line.y, 0.0).normalize()
    }
}

/// `n` points along a sinusoidal path inside the plane through `origin`,
/// perturbed by uniform noise of amplitude `noise` on every axis. Parameter
/// `u` runs over [0, 20] and the in-plane offset is `2·sin(u)`.
pub fn noisy_plane_trace(
    plane: &PlaneSpec,
    origin: Vector3<f64>,
    n: usize,
    noise: f64,
    seed: u64,
) -> Trace {
    let (strike, dip_line) = plane.basis();
    let outcrop = plane.outcrop_normal();
    let mut rng = StdRng::seed_from_u64(seed);
    let step = 20.0 / (n.max(2) - 1) as f64;
    let points = (0..n)
        .map(|i| {
            let u = i as f64 * step;
            let jitter = Vector3::new(
                rng.gen_range(-noise..=noise),
                rng.gen_range(-noise..=noise),
                rng.gen_range(-noise..=noise),
            );
            let position = origin + strike * u + dip_line * (2.0 * u.sin()) + jitter;
            TracePoint::new(position, Some(outcrop))
        })
        .collect();
    Trace::new(points)
}

/// Lower and upper traces of a unit of thickness `separation`; the upper
/// trace is offset from the lower one against the downward pole.
pub fn plane_pair(
    plane: &PlaneSpec,
    n: usize,
    separation: f64,
    noise: f64,
    seed: u64,
) -> (Trace, Trace) {
    let lower = noisy_plane_trace(plane, Vector3::zeros(), n, noise, seed);
    let upper = noisy_plane_trace(plane, -plane.pole() * separation, n, noise, seed + 1);
    (lower, upper)
}

/// Same trace with every sampled normal removed.
pub fn without_normals(trace: &Trace) -> Trace {
    Trace::new(
        trace
            .points
            .iter()
            .map(|p| TracePoint::new(p.position, None))
            .collect(),
    )
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
