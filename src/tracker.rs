//! Per-sample maximum-a-posteriori bookkeeping.
//!
//! Every sample remembers the best-scoring window that contained it. Scores
//! are log posteriors, so an untouched sample holds `-∞` and is only
//! overwritten on strict improvement.

use crate::error::SneError;
use crate::scoring::{Orientation, ScoredWindow};
use nalgebra::Vector3;
use serde::Serialize;

/// Segment id of samples that no scored window covered.
pub const UNASSIGNED_SEGMENT: i64 = -1;

/// Best window seen so far for one sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    /// Log posterior of the winning window, `-∞` when none.
    pub log_score: f64,
    pub normal: Option<Vector3<f64>>,
    #[serde(skip)]
    pub orientation: Option<Orientation>,
    /// Winning window `[lo, hi)` in sorted positions.
    pub window: Option<(usize, usize)>,
    pub segment_id: i64,
}

impl Default for Estimate {
    fn default() -> Self {
        Self {
            log_score: f64::NEG_INFINITY,
            normal: None,
            orientation: None,
            window: None,
            segment_id: UNASSIGNED_SEGMENT,
        }
    }
}

impl Estimate {
    pub fn is_assigned(&self) -> bool {
        self.window.is_some()
    }

    /// Posterior weight `exp(log_score)`; zero when unassigned.
    pub fn weight(&self) -> f64 {
        self.log_score.exp()
    }
}

/// Keeps the highest-scoring window per sorted position of one series.
#[derive(Clone, Debug)]
pub struct MapTracker {
    estimates: Vec<Estimate>,
    offered: usize,
    improvements: usize,
}

impl MapTracker {
    pub fn new(len: usize) -> Self {
        Self {
            estimates: vec![Estimate::default(); len],
            offered: 0,
            improvements: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    /// Windows offered so far.
    pub fn offered(&self) -> usize {
        self.offered
    }

    /// Per-sample overwrites so far.
    pub fn improvements(&self) -> usize {
        self.improvements
    }

    pub fn get(&self, pos: usize) -> Option<&Estimate> {
        self.estimates.get(pos)
    }

    /// Record `window` for every sample it covers where it beats the current
    /// best.
    pub fn offer(&mut self, window: &ScoredWindow) {
        self.offered += 1;
        let score = window.log_posterior();
        let n = self.estimates.len() as i64;
        let segment_id = window.hi as i64 * n + window.lo as i64;
        let hi = window.hi.min(self.estimates.len());
        for est in &mut self.estimates[window.lo..hi] {
            if score > est.log_score {
                *est = Estimate {
                    log_score: score,
                    normal: Some(window.normal),
                    orientation: Some(window.orientation),
                    window: Some((window.lo, window.hi)),
                    segment_id,
                };
                self.improvements += 1;
            }
        }
    }

    /// Fold `other` into `self`. `other` must cover windows that come after
    /// every window already offered to `self`; ties keep the earlier window,
    /// exactly as a single sequential sweep would.
    pub fn merge(&mut self, other: MapTracker) {
        debug_assert_eq!(self.estimates.len(), other.estimates.len());
        self.offered += other.offered;
        for (mine, theirs) in self.estimates.iter_mut().zip(other.estimates) {
            if theirs.log_score > mine.log_score {
                *mine = theirs;
                self.improvements += 1;
            }
        }
    }

    /// Freeze the estimates. Fails when no sample received a window.
    pub fn finalize(self) -> Result<SurfaceEstimates, SneError> {
        if !self.estimates.iter().any(Estimate::is_assigned) {
            return Err(SneError::NoValidWindow);
        }
        Ok(SurfaceEstimates {
            estimates: self.estimates,
            windows_scored: self.offered,
        })
    }
}

/// Finalized per-sample estimates of one series, in sorted order.
#[derive(Clone, Debug)]
pub struct SurfaceEstimates {
    estimates: Vec<Estimate>,
    windows_scored: usize,
}

impl SurfaceEstimates {
    pub fn estimates(&self) -> &[Estimate] {
        &self.estimates
    }

    pub fn estimates_mut(&mut self) -> &mut [Estimate] {
        &mut self.estimates
    }

    pub fn get(&self, pos: usize) -> Option<&Estimate> {
        self.estimates.get(pos)
    }

    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    pub fn windows_scored(&self) -> usize {
        self.windows_scored
    }

    pub fn assigned(&self) -> usize {
        self.estimates.iter().filter(|e| e.is_assigned()).count()
    }
}
