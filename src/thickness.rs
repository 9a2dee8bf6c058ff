//! Perpendicular distance between the two boundary surfaces of a unit.
//!
//! For a point `p` with estimated normal `n` the nearest point `q` of the
//! opposite surface is found and the thickness is `|n·(q − p)|`. The normal is
//! flipped when needed so it points toward the opposite surface. Points with
//! no correspondence within the cutoff, or without an estimated normal, get
//! [`SENTINEL_THICKNESS`].

use crate::spatial::SpatialIndex;
use log::debug;
use nalgebra::Vector3;
use serde::Serialize;

/// Thickness recorded when no opposite point lies within the cutoff.
pub const SENTINEL_THICKNESS: f64 = 1.0;

/// Neighbors queried on the opposite surface.
pub const NEIGHBORS: usize = 10;

/// Thickness measured at one point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ThicknessSample {
    pub thickness: f64,
    /// True when the estimated normal must be negated to face the opposite
    /// surface.
    pub flip: bool,
    /// False when the sentinel was recorded.
    pub matched: bool,
}

impl ThicknessSample {
    pub fn sentinel() -> Self {
        Self {
            thickness: SENTINEL_THICKNESS,
            flip: false,
            matched: false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ThicknessEstimator {
    cutoff_squared: f64,
}

impl ThicknessEstimator {
    pub fn new(cutoff_distance: f64) -> Self {
        Self {
            cutoff_squared: cutoff_distance * cutoff_distance,
        }
    }

    pub fn cutoff_squared(&self) -> f64 {
        self.cutoff_squared
    }

    /// Thickness at `point` against the surface indexed by `opposite`.
    pub fn measure<I: SpatialIndex + ?Sized>(
        &self,
        point: &Vector3<f64>,
        normal: Option<&Vector3<f64>>,
        opposite: &I,
    ) -> ThicknessSample {
        let Some(normal) = normal else {
            return ThicknessSample::sentinel();
        };
        let neighbors = opposite.nearest_neighbors(point, NEIGHBORS);
        let Some(nearest) = neighbors.first() else {
            return ThicknessSample::sentinel();
        };
        if nearest.squared_distance > self.cutoff_squared {
            return ThicknessSample::sentinel();
        }
        let d = normal.dot(&(nearest.position - point));
        ThicknessSample {
            thickness: d.abs(),
            flip: d < 0.0,
            matched: true,
        }
    }

    /// Measure every point of a surface and orient its normals toward the
    /// opposite surface in place.
    pub fn apply<I: SpatialIndex + ?Sized>(
        &self,
        points: &[Vector3<f64>],
        normals: &mut [Option<Vector3<f64>>],
        opposite: &I,
    ) -> Vec<ThicknessSample> {
        let samples: Vec<ThicknessSample> = points
            .iter()
            .zip(normals.iter_mut())
            .map(|(p, n)| {
                let sample = self.measure(p, n.as_ref(), opposite);
                if sample.flip {
                    if let Some(n) = n.as_mut() {
                        *n = -*n;
                    }
                }
                sample
            })
            .collect();
        debug!(
            "ThicknessEstimator: points={} matched={} flipped={}",
            samples.len(),
            samples.iter().filter(|s| s.matched).count(),
            samples.iter().filter(|s| s.flip).count()
        );
        samples
    }
}
