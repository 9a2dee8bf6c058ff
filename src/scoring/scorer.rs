use super::accumulator::WindowAccumulator;
use super::prior::log_bias_prior;
use super::wishart::{log_scale_factor, log_wishart, log_wishart_marginal_alpha};
use crate::angle::{trend_plunge, wrap_pi};
use crate::breaks::BreakIndex;
use crate::config::{AlphaTreatment, EstimatorParams};
use crate::eigen::SortedEigen;
use crate::error::{Degeneracy, WindowRejection};
use crate::series::OrderedSeries;
use nalgebra::{Matrix3, Vector3};

const COS_PLUNGE_EPS: f64 = 1e-12;

/// Orientation of the eigen-system of a window, in radians.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation {
    /// Trend of the plane normal, in [0, 2π).
    pub trend: f64,
    /// Plunge of the plane normal, in [0, π/2].
    pub plunge: f64,
    /// Rotation of the intermediate eigenvector about the normal, in [0, π).
    pub alpha: f64,
}

/// A window that produced a posterior score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredWindow {
    pub lo: usize,
    pub hi: usize,
    /// Candidate plane normal: least-variance eigenvector, unit length.
    pub normal: Vector3<f64>,
    pub orientation: Orientation,
    /// Covariance eigenvalues, largest first.
    pub eigenvalues: [f64; 3],
    /// Eigenvectors as columns, matching `eigenvalues`.
    pub eigenvectors: Matrix3<f64>,
    pub log_likelihood: f64,
    /// `None` when bias correction is off.
    pub log_prior: Option<f64>,
}

impl ScoredWindow {
    pub fn len(&self) -> usize {
        self.hi - self.lo
    }

    pub fn is_empty(&self) -> bool {
        self.hi == self.lo
    }

    pub fn log_posterior(&self) -> f64 {
        self.log_likelihood + self.log_prior.unwrap_or(0.0)
    }

    /// Unnormalized posterior probability, `exp(log_posterior)`.
    pub fn posterior(&self) -> f64 {
        self.log_posterior().exp()
    }
}

/// Scores candidate windows: scatter → eigen-system → orientation →
/// Wishart likelihood × sampling-bias prior.
#[derive(Clone, Debug)]
pub struct SegmentScorer {
    min_size: usize,
    max_size: usize,
    dof: f64,
    use_prior: bool,
    alpha: AlphaTreatment,
}

impl SegmentScorer {
    /// `use_prior` is the effective bias-correction switch for the series
    /// being processed (already disabled when the series has no normals).
    pub fn new(params: &EstimatorParams, use_prior: bool) -> Self {
        Self {
            min_size: params.min_size,
            max_size: params.max_size,
            dof: params.degrees_of_freedom(),
            use_prior,
            alpha: params.alpha,
        }
    }

    pub fn min_size(&self) -> usize {
        self.min_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn uses_prior(&self) -> bool {
        self.use_prior
    }

    /// Score `[lo, hi)` from scratch. Replays the same accumulation as the
    /// sweep, so the result is bit-identical to the sweep's score.
    pub fn score_window(
        &self,
        series: &OrderedSeries,
        breaks: &BreakIndex,
        lo: usize,
        hi: usize,
    ) -> Result<ScoredWindow, WindowRejection> {
        let hi = hi.min(series.len());
        let len = hi.saturating_sub(lo);
        self.check_length(len)?;
        if let Some(pos) = breaks.first_in(lo, hi) {
            return Err(WindowRejection::ContainsBreak(pos));
        }
        let mut acc = WindowAccumulator::new(lo);
        for pos in lo..hi {
            acc.push(series.get(pos), false);
        }
        self.score_accumulated(&acc)
    }

    /// Score the window currently held by `acc`.
    pub fn score_accumulated(
        &self,
        acc: &WindowAccumulator,
    ) -> Result<ScoredWindow, WindowRejection> {
        self.check_length(acc.len())?;
        if let Some(pos) = acc.first_break() {
            return Err(WindowRejection::ContainsBreak(pos));
        }

        let x = acc.scatter();
        let det_x = x.determinant();
        if !(det_x > 0.0 && det_x.is_finite()) {
            return Err(Degeneracy::SingularScatter.into());
        }

        let eig = SortedEigen::new(&acc.covariance());
        if eig.values.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(Degeneracy::NonPositiveEigenvalue.into());
        }

        let normal = eig.minor();
        let orientation = orientation_of(&eig)?;

        let log_scale = log_scale_factor(det_x, self.dof);
        let log_likelihood = match self.alpha {
            AlphaTreatment::Point => log_wishart(
                x,
                self.dof,
                orientation.trend,
                orientation.plunge,
                orientation.alpha,
                eig.values,
                log_scale,
            ),
            AlphaTreatment::Marginalize { steps } => log_wishart_marginal_alpha(
                x,
                self.dof,
                orientation.trend,
                orientation.plunge,
                eig.values,
                log_scale,
                steps,
            ),
        };

        let log_prior = if self.use_prior {
            let outcrop = acc
                .mean_normal()
                .ok_or(Degeneracy::VanishingMeanNormal)?;
            Some(log_bias_prior(
                orientation.trend,
                orientation.plunge,
                &outcrop,
            ))
        } else {
            None
        };

        let scored = ScoredWindow {
            lo: acc.lo(),
            hi: acc.hi(),
            normal,
            orientation,
            eigenvalues: eig.values,
            eigenvectors: eig.vectors,
            log_likelihood,
            log_prior,
        };
        if scored.log_posterior().is_nan() {
            return Err(Degeneracy::NonFiniteScore.into());
        }
        Ok(scored)
    }

    fn check_length(&self, len: usize) -> Result<(), WindowRejection> {
        if len < self.min_size {
            return Err(WindowRejection::TooShort {
                len,
                minimum: self.min_size,
            });
        }
        if len > self.max_size {
            return Err(WindowRejection::TooLong {
                len,
                maximum: self.max_size,
            });
        }
        Ok(())
    }
}

/// Trend/plunge of the least-variance eigenvector and the rotation `alpha`
/// of the intermediate eigenvector about it.
pub fn orientation_of(eig: &SortedEigen) -> Result<Orientation, Degeneracy> {
    let (trend, plunge) = trend_plunge(&eig.minor());
    let cos_plunge = plunge.cos();
    if cos_plunge.abs() < COS_PLUNGE_EPS {
        return Err(Degeneracy::VerticalNormal);
    }
    let ratio = (eig.intermediate().z / cos_plunge).clamp(-1.0, 1.0);
    let alpha = wrap_pi(ratio.asin());
    Ok(Orientation {
        trend,
        plunge,
        alpha,
    })
}
