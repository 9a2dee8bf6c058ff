//! Wishart likelihood of a window scatter matrix under a plane hypothesis.
//!
//! The scatter `X` of `n` points drawn around a plane is modelled as
//! `X ~ W₃(Σ, n)`, where the scale matrix `Σ` shares the window eigenvalues
//! and has its eigenvectors rotated into the orientation `(trend, plunge,
//! alpha)`. Only the eigenvector basis depends on the hypothesis, so the
//! normalizing terms are computed once per window.

use crate::angle::direction_from_trend_plunge;
use nalgebra::{Matrix3, Vector3};
use statrs::function::gamma::ln_gamma;
use std::f64::consts::{LN_2, PI};

/// Orientation-independent part of `ln W₃(X; Σ, n)`:
/// `(n-4)/2·ln|X| - 3n/2·ln 2 - ln Γ₃(n/2)`.
pub fn log_scale_factor(det_x: f64, dof: f64) -> f64 {
    let half = dof / 2.0;
    let log_gamma3 = 1.5 * PI.ln() + ln_gamma(half) + ln_gamma(half - 0.5) + ln_gamma(half - 1.0);
    (dof - 4.0) * 0.5 * det_x.ln() - dof * 1.5 * LN_2 - log_gamma3
}

/// Eigenvector basis of the scale matrix for an orientation. Column 2 is the
/// plane normal `(trend, plunge)`, column 1 is the in-plane axis rotated by
/// `alpha`, column 0 completes the frame.
pub fn scale_basis(trend: f64, plunge: f64, alpha: f64) -> Matrix3<f64> {
    let (sp, cp) = trend.sin_cos();
    let (st, ct) = plunge.sin_cos();
    let (sa, ca) = alpha.sin_cos();
    let e2 = direction_from_trend_plunge(trend, plunge);
    let e1 = Vector3::new(sp * st * sa - cp * ca, sp * ca + st * cp * sa, sa * ct);
    let e0 = e2.cross(&e1);
    Matrix3::from_columns(&[e0, e1, e2])
}

/// `ln W₃(X; Σ, n)` with `Σ = B·diag(eigenvalues)·Bᵀ`, `B = scale_basis(..)`.
/// `eigenvalues` are ordered to match the basis columns (largest first).
pub fn log_wishart(
    x: &Matrix3<f64>,
    dof: f64,
    trend: f64,
    plunge: f64,
    alpha: f64,
    eigenvalues: [f64; 3],
    log_scale: f64,
) -> f64 {
    let basis = scale_basis(trend, plunge, alpha);
    let inv_diag = Matrix3::from_diagonal(&Vector3::new(
        1.0 / eigenvalues[0],
        1.0 / eigenvalues[1],
        1.0 / eigenvalues[2],
    ));
    let inv_scale = basis * inv_diag * basis.transpose();
    let trace = (inv_scale * x).trace();
    let log_det_scale = (eigenvalues[0] * eigenvalues[1] * eigenvalues[2]).ln();
    log_scale - 0.5 * (trace + dof * log_det_scale)
}

/// `ln ∫₀^π W₃(X; Σ(alpha), n) dalpha`, trapezoid rule over `steps`
/// intervals, accumulated with log-sum-exp.
pub fn log_wishart_marginal_alpha(
    x: &Matrix3<f64>,
    dof: f64,
    trend: f64,
    plunge: f64,
    eigenvalues: [f64; 3],
    log_scale: f64,
    steps: u32,
) -> f64 {
    let steps = steps.max(1);
    let da = PI / steps as f64;
    let mut sum = LogSumExp::default();
    for i in 0..=steps {
        let weight = if i == 0 || i == steps { 0.5 * da } else { da };
        let log_density = log_wishart(x, dof, trend, plunge, i as f64 * da, eigenvalues, log_scale);
        sum.add(log_density, weight);
    }
    sum.value()
}

/// Running `ln Σ wᵢ·exp(lᵢ)`, rescaled whenever a larger term arrives.
#[derive(Clone, Copy, Debug)]
struct LogSumExp {
    max: f64,
    scaled: f64,
}

impl Default for LogSumExp {
    fn default() -> Self {
        Self {
            max: f64::NEG_INFINITY,
            scaled: 0.0,
        }
    }
}

impl LogSumExp {
    fn add(&mut self, log_value: f64, weight: f64) {
        if log_value == f64::NEG_INFINITY {
            return;
        }
        if log_value > self.max {
            self.scaled = self.scaled * (self.max - log_value).exp() + weight;
            self.max = log_value;
        } else {
            self.scaled += weight * (log_value - self.max).exp();
        }
    }

    fn value(&self) -> f64 {
        if !self.max.is_finite() {
            return self.max;
        }
        self.max + self.scaled.ln()
    }
}
