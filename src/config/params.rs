//! Parameter types configuring the estimation run.
//!
//! Every tunable is carried explicitly through each call; nothing is stored
//! process-wide. Defaults mirror the values used interactively on outcrop
//! models (windows of 100–1000 samples, 10 m thickness search radius).

use crate::error::SneError;
use serde::{Deserialize, Serialize};

/// Smallest window accepted by [`EstimatorParams::validate`].
pub const MIN_WINDOW_FLOOR: usize = 5;
/// Smallest maximum window accepted by [`EstimatorParams::validate`].
pub const MAX_WINDOW_FLOOR: usize = 50;

/// How the third orientation angle (rotation about the normal) enters the
/// posterior.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AlphaTreatment {
    /// Evaluate the density at the alpha implied by the window eigenvectors.
    #[default]
    Point,
    /// Integrate the density over alpha in [0, π] with the trapezoid rule.
    Marginalize { steps: u32 },
}

/// Run-wide parameters for normal and thickness estimation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorParams {
    /// Minimum window length in samples.
    pub min_size: usize,
    /// Maximum window length in samples.
    pub max_size: usize,
    /// Furthest distance to search for the opposite surface during thickness
    /// estimation. Compared squared.
    pub cutoff_distance: f64,
    /// Compute thickness when a region has both boundaries.
    pub compute_thickness: bool,
    /// Multiply the likelihood by the outcrop sampling-bias prior. Disabled
    /// automatically for regions without sampled normals.
    pub use_bias_correction: bool,
    pub alpha: AlphaTreatment,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            min_size: 100,
            max_size: 1000,
            cutoff_distance: 10.0,
            compute_thickness: true,
            use_bias_correction: true,
            alpha: AlphaTreatment::Point,
        }
    }
}

impl EstimatorParams {
    /// Degrees of freedom used by the Wishart likelihood for every window of
    /// a run. Held constant so scores of windows of different length remain
    /// comparable.
    pub fn degrees_of_freedom(&self) -> f64 {
        self.max_size as f64 - self.min_size as f64 - 1.0
    }

    pub fn cutoff_squared(&self) -> f64 {
        self.cutoff_distance * self.cutoff_distance
    }

    /// Reject parameter sets that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), SneError> {
        if self.max_size < self.min_size {
            return Err(SneError::BadConfiguration(format!(
                "max_size ({}) is less than min_size ({})",
                self.max_size, self.min_size
            )));
        }
        if self.min_size < MIN_WINDOW_FLOOR {
            return Err(SneError::BadConfiguration(format!(
                "min_size ({}) must be at least {MIN_WINDOW_FLOOR}",
                self.min_size
            )));
        }
        if self.max_size < MAX_WINDOW_FLOOR {
            return Err(SneError::BadConfiguration(format!(
                "max_size ({}) must be at least {MAX_WINDOW_FLOOR}",
                self.max_size
            )));
        }
        // A 3x3 Wishart density needs more than two degrees of freedom.
        if self.degrees_of_freedom() < 3.0 {
            return Err(SneError::BadConfiguration(format!(
                "max_size - min_size - 1 = {} leaves fewer than 3 degrees of freedom",
                self.degrees_of_freedom()
            )));
        }
        if !self.cutoff_distance.is_finite() || self.cutoff_distance < 0.0 {
            return Err(SneError::BadConfiguration(format!(
                "cutoff_distance ({}) must be finite and non-negative",
                self.cutoff_distance
            )));
        }
        if let AlphaTreatment::Marginalize { steps: 0 } = self.alpha {
            return Err(SneError::BadConfiguration(
                "alpha marginalization needs at least one step".to_string(),
            ));
        }
        Ok(())
    }
}
