//! Posterior scoring of candidate windows.
//!
//! A window `[lo, hi)` of an ordered series is summarized by its running
//! centroid and scatter (`accumulator`). The scatter is eigen-decomposed, the
//! least-variance eigenvector is taken as the plane normal and converted to
//! `(trend, plunge, alpha)`, and the window is scored as:
//!
//! - the Wishart log-density of the scatter under a scale matrix sharing the
//!   window eigenvalues and rotated into that orientation (`wishart`), plus
//! - optionally, the log of the outcrop sampling-bias prior (`prior`).
//!
//! Scores live in the log domain; `exp` of a score is the unnormalized
//! posterior.
//!
//! Notes
//! - The degrees of freedom are fixed for a run (`max_size - min_size - 1`)
//!   rather than tied to the window length, so scores of windows with
//!   different lengths are compared under the same density family.
//! - Every degenerate window (collinear samples, vertical normal, cancelling
//!   sampled normals) is rejected with a [`WindowRejection`] and never scored.
//!
//! [`WindowRejection`]: crate::error::WindowRejection

pub mod accumulator;
pub mod prior;
pub mod scorer;
pub mod wishart;

pub use accumulator::WindowAccumulator;
pub use prior::{bias_prior, log_bias_prior};
pub use scorer::{orientation_of, Orientation, ScoredWindow, SegmentScorer};
pub use wishart::{log_scale_factor, log_wishart, log_wishart_marginal_alpha, scale_basis};
