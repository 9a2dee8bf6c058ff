use crate::series::Sample;
use nalgebra::{Matrix3, Vector3};

/// Running statistics of a contiguous window `[lo, lo + len)` of a series.
///
/// Centroid and scatter use the running mean / co-moment update so the
/// scatter stays accurate for georeferenced coordinates with large offsets.
#[derive(Clone, Debug)]
pub struct WindowAccumulator {
    lo: usize,
    count: usize,
    mean: Vector3<f64>,
    scatter: Matrix3<f64>,
    normal_sum: Vector3<f64>,
    first_break: Option<usize>,
}

impl WindowAccumulator {
    pub fn new(lo: usize) -> Self {
        Self {
            lo,
            count: 0,
            mean: Vector3::zeros(),
            scatter: Matrix3::zeros(),
            normal_sum: Vector3::zeros(),
            first_break: None,
        }
    }

    pub fn reset(&mut self, lo: usize) {
        *self = Self::new(lo);
    }

    /// Append the sample at sorted position `lo + len()`.
    pub fn push(&mut self, sample: &Sample, is_break: bool) {
        if is_break && self.first_break.is_none() {
            self.first_break = Some(self.lo + self.count);
        }
        self.count += 1;
        let n = self.count as f64;
        let delta = sample.position - self.mean;
        self.mean += delta / n;
        self.scatter += delta * delta.transpose() * ((n - 1.0) / n);
        self.normal_sum += sample.normal_or_zero();
    }

    pub fn lo(&self) -> usize {
        self.lo
    }

    /// Exclusive end of the window.
    pub fn hi(&self) -> usize {
        self.lo + self.count
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn centroid(&self) -> Vector3<f64> {
        self.mean
    }

    /// Unnormalized scatter matrix `Σ (p - c)(p - c)ᵀ`.
    pub fn scatter(&self) -> &Matrix3<f64> {
        &self.scatter
    }

    pub fn covariance(&self) -> Matrix3<f64> {
        if self.count == 0 {
            Matrix3::zeros()
        } else {
            self.scatter / self.count as f64
        }
    }

    /// Normalized mean of the sampled normals, `None` when they cancel out.
    pub fn mean_normal(&self) -> Option<Vector3<f64>> {
        let len = self.normal_sum.norm();
        (len > 1e-12).then(|| self.normal_sum / len)
    }

    /// First flagged break pushed into the window.
    pub fn first_break(&self) -> Option<usize> {
        self.first_break
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(x: f64, y: f64, z: f64) -> Sample {
        Sample {
            position: Vector3::new(x, y, z),
            normal: Some(Vector3::new(0.0, 0.0, 1.0)),
            original_index: 0,
        }
    }

    #[test]
    fn matches_two_pass_scatter() {
        let pts = [
            sample(1.0e6 + 0.0, 5.0e6 + 0.0, 120.0),
            sample(1.0e6 + 1.0, 5.0e6 + 0.5, 120.3),
            sample(1.0e6 + 2.0, 5.0e6 - 0.2, 119.8),
            sample(1.0e6 + 3.5, 5.0e6 + 0.1, 120.1),
        ];
        let mut acc = WindowAccumulator::new(3);
        for p in &pts {
            acc.push(p, false);
        }
        let c = pts.iter().fold(Vector3::zeros(), |a: Vector3<f64>, s| a + s.position) / 4.0;
        let mut x = Matrix3::zeros();
        for p in &pts {
            let d = p.position - c;
            x += d * d.transpose();
        }
        assert!((acc.centroid() - c).norm() < 1e-6);
        assert!((acc.scatter() - x).norm() < 1e-6);
        assert_eq!(acc.hi(), 7);
        assert_eq!(acc.mean_normal(), Some(Vector3::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn records_first_break_position() {
        let mut acc = WindowAccumulator::new(10);
        acc.push(&sample(0.0, 0.0, 0.0), false);
        acc.push(&sample(1.0, 0.0, 0.0), true);
        acc.push(&sample(2.0, 0.0, 0.0), true);
        assert_eq!(acc.first_break(), Some(11));
        acc.reset(4);
        assert!(acc.is_empty());
        assert_eq!(acc.first_break(), None);
    }
}
