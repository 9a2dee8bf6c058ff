//! Ordering of traced points along the principal axis of a region.
//!
//! Traces of one region are digitized independently and in arbitrary
//! directions, so their points are merged and re-ordered before windows can
//! be slid along them:
//!
//! - The covariance of the combined scatter is eigen-decomposed; the major
//!   eigenvector is the long axis of the region.
//! - Every point is projected onto that axis and the points are stably sorted
//!   by projection, O(N log N).
//! - The permutation is retained so per-sample results can be written back in
//!   input order.

use crate::eigen::SortedEigen;
use crate::error::{Shortfall, SneError};
use crate::input::TracePoint;
use log::debug;
use nalgebra::{Matrix3, Vector3};

const RANK_REL_TOL: f64 = 1e-12;

/// A point of an ordered series.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub position: Vector3<f64>,
    pub normal: Option<Vector3<f64>>,
    /// Index of the point in the input sequence.
    pub original_index: usize,
}

impl Sample {
    /// Sampled normal, with missing normals read as the zero vector.
    #[inline]
    pub fn normal_or_zero(&self) -> Vector3<f64> {
        self.normal.unwrap_or_else(Vector3::zeros)
    }

    #[inline]
    pub fn has_nonzero_normal(&self) -> bool {
        self.normal.is_some_and(|n| n.norm_squared() > 0.0)
    }
}

/// Samples sorted by their projection onto the region's principal axis.
#[derive(Clone, Debug)]
pub struct OrderedSeries {
    samples: Vec<Sample>,
    axis: Vector3<f64>,
    input_len: usize,
}

impl OrderedSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn get(&self, pos: usize) -> &Sample {
        &self.samples[pos]
    }

    /// Unit principal axis used for ordering.
    pub fn axis(&self) -> Vector3<f64> {
        self.axis
    }

    pub fn positions(&self) -> impl Iterator<Item = Vector3<f64>> + '_ {
        self.samples.iter().map(|s| s.position)
    }

    /// Original index of the sample at each sorted position.
    pub fn sorted_to_original(&self) -> Vec<usize> {
        self.samples.iter().map(|s| s.original_index).collect()
    }

    /// Number of points handed to the builder, including dropped ones.
    pub fn input_len(&self) -> usize {
        self.input_len
    }

    /// Sorted position of each original index; `None` for points dropped
    /// because of non-finite coordinates.
    pub fn original_to_sorted(&self) -> Vec<Option<usize>> {
        let mut out = vec![None; self.input_len];
        for (pos, s) in self.samples.iter().enumerate() {
            out[s.original_index] = Some(pos);
        }
        out
    }

    /// True when at least one sample carries a non-zero sampled normal.
    pub fn has_normals(&self) -> bool {
        self.samples.iter().any(Sample::has_nonzero_normal)
    }
}

/// Builds an [`OrderedSeries`] from the points of one region.
#[derive(Clone, Copy, Debug)]
pub struct OrderedSeriesBuilder {
    min_size: usize,
}

impl OrderedSeriesBuilder {
    pub fn new(min_size: usize) -> Self {
        Self { min_size }
    }

    pub fn build<I>(&self, points: I) -> Result<OrderedSeries, SneError>
    where
        I: IntoIterator<Item = TracePoint>,
    {
        let mut input_len = 0usize;
        let samples: Vec<Sample> = points
            .into_iter()
            .enumerate()
            .inspect(|_| input_len += 1)
            .filter(|(_, p)| p.position.iter().all(|c| c.is_finite()))
            .map(|(original_index, p)| Sample {
                position: p.position,
                normal: p.normal,
                original_index,
            })
            .collect();

        if samples.len() < self.min_size {
            return Err(SneError::InsufficientData(Shortfall::TooFewPoints {
                found: samples.len(),
                minimum: self.min_size,
            }));
        }

        let axis = principal_axis(&samples)?;
        let mut keyed: Vec<(f64, Sample)> = samples
            .into_iter()
            .map(|s| (s.position.dot(&axis), s))
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

        debug!(
            "OrderedSeriesBuilder: {} samples along axis [{:.3}, {:.3}, {:.3}]",
            keyed.len(),
            axis.x,
            axis.y,
            axis.z
        );
        Ok(OrderedSeries {
            samples: keyed.into_iter().map(|(_, s)| s).collect(),
            axis,
            input_len,
        })
    }
}

fn principal_axis(samples: &[Sample]) -> Result<Vector3<f64>, SneError> {
    let n = samples.len() as f64;
    let centroid = samples
        .iter()
        .fold(Vector3::zeros(), |acc: Vector3<f64>, s| acc + s.position)
        / n;
    let mut cov = Matrix3::zeros();
    for s in samples {
        let d = s.position - centroid;
        cov += d * d.transpose();
    }
    cov /= n;

    let eig = SortedEigen::new(&cov);
    let rank = eig.rank(RANK_REL_TOL);
    if rank < 3 {
        return Err(SneError::InsufficientData(Shortfall::RankDeficient { rank }));
    }
    Ok(eig.major())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scatter(n: usize) -> Vec<TracePoint> {
        // Points along x with a small helical wobble so the scatter has full rank.
        (0..n)
            .map(|i| {
                let t = i as f64;
                TracePoint::new(
                    Vector3::new(t, 0.3 * (t * 0.7).sin(), 0.2 * (t * 1.3).cos()),
                    None,
                )
            })
            .collect()
    }

    #[test]
    fn sorts_along_long_axis_and_keeps_mapping() {
        let mut pts = scatter(30);
        pts.reverse();
        let series = OrderedSeriesBuilder::new(5).build(pts.clone()).unwrap();
        assert_eq!(series.len(), 30);
        let proj: Vec<f64> = series.positions().map(|p| p.dot(&series.axis())).collect();
        assert!(proj.windows(2).all(|w| w[0] <= w[1]));

        let s2o = series.sorted_to_original();
        let o2s = series.original_to_sorted();
        for (pos, &orig) in s2o.iter().enumerate() {
            assert_eq!(o2s[orig], Some(pos));
            assert_eq!(series.get(pos).position, pts[orig].position);
        }
    }

    #[test]
    fn rejects_too_few_points() {
        let err = OrderedSeriesBuilder::new(50).build(scatter(10)).unwrap_err();
        assert_eq!(
            err,
            SneError::InsufficientData(Shortfall::TooFewPoints {
                found: 10,
                minimum: 50
            })
        );
    }

    #[test]
    fn rejects_planar_scatter() {
        let pts: Vec<TracePoint> = (0..20)
            .map(|i| TracePoint::new(Vector3::new(i as f64, (i % 3) as f64, 0.0), None))
            .collect();
        let err = OrderedSeriesBuilder::new(5).build(pts).unwrap_err();
        assert!(matches!(
            err,
            SneError::InsufficientData(Shortfall::RankDeficient { rank: 2 })
        ));
    }

    #[test]
    fn drops_non_finite_points_but_keeps_input_indices() {
        let mut pts = scatter(12);
        pts[4].position.x = f64::NAN;
        let series = OrderedSeriesBuilder::new(5).build(pts).unwrap();
        assert_eq!(series.len(), 11);
        assert_eq!(series.input_len(), 12);
        let o2s = series.original_to_sorted();
        assert_eq!(o2s[4], None);
        assert!(o2s.iter().enumerate().all(|(i, p)| i == 4 || p.is_some()));
    }

    #[test]
    fn detects_missing_normals() {
        let series = OrderedSeriesBuilder::new(5).build(scatter(10)).unwrap();
        assert!(!series.has_normals());
    }
}
